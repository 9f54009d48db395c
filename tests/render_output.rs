//! Rendering of complete configurations.

mod common;

use common::{example_configuration, EXAMPLE_TEXT};
use harp::model::{Acl, Mode, Operator, Proxy, Server, ServerOptions, Target};
use harp::render::{render, Renderer};

#[test]
fn test_end_to_end_example() {
    let configuration = example_configuration("/etc/haproxy/prod.cfg");
    assert_eq!(render(&configuration).unwrap(), EXAMPLE_TEXT);
}

#[test]
fn test_rendering_twice_is_identical() {
    let configuration = example_configuration("/etc/haproxy/prod.cfg");
    let renderer = Renderer::default();
    assert_eq!(
        renderer.render(&configuration).unwrap(),
        renderer.render(&configuration).unwrap()
    );
}

#[test]
fn test_full_configuration() {
    let mut configuration = example_configuration("/etc/haproxy/prod.cfg");
    configuration.include_globals = true;
    configuration.user = Some("haproxy".to_string());
    configuration.default_server_timeout = None;

    let mut http_in = Proxy::frontend("http-in", "*:80").unwrap();
    http_in.options.mode = Some(Mode::Http);
    http_in.options.http_log = true;
    http_in.add_acl(Acl::new("is_api", "path_beg /api").unwrap()).unwrap();
    http_in.add_acl(Acl::new("is_static", "path_end .css").unwrap()).unwrap();
    {
        let frontend = http_in.as_frontend_mut().unwrap();
        frontend.default_backend = Some("web".to_string());
        // Inserted out of rank order.
        frontend
            .add_target(Target::new(20, "static", Operator::If, "is_static").unwrap())
            .unwrap();
        frontend
            .add_target(Target::new(10, "api", Operator::Unless, "!is_api").unwrap())
            .unwrap();
    }
    configuration.add_proxy(http_in).unwrap();

    let mut api = Proxy::backend("api").unwrap();
    let options = ServerOptions {
        check: true,
        inter: Some(2000),
        weight: Some(10),
        ..Default::default()
    };
    api.as_backend_mut()
        .unwrap()
        .add_server(Server::new("a1", "10.0.1.1:9000").unwrap().with_options(options).unwrap())
        .unwrap();
    api.as_backend_mut()
        .unwrap()
        .add_server(Server::new("a2", "10.0.1.2:9000").unwrap())
        .unwrap();
    configuration.add_proxy(api).unwrap();

    let expected = "\
global
    daemon
    pidfile /var/run/haproxy.pid
    user haproxy

defaults
    mode http
    timeout connect 5000ms
    timeout client 50000ms

frontend http-in
    bind *:80
    mode http
    option httplog

    acl is_api path_beg /api
    acl is_static path_end .css

    use_backend api unless !is_api
    use_backend static if is_static

    default_backend web

backend web
    mode http
    server s1 10.0.0.1 port 8080

backend api
    server a1 10.0.1.1:9000 check inter 2000 weight 10
    server a2 10.0.1.2:9000 \n";

    assert_eq!(render(&configuration).unwrap(), expected);
}

#[test]
fn test_sections_can_be_switched_off() {
    let mut configuration = example_configuration("/etc/haproxy/prod.cfg");
    configuration.include_defaults = false;
    assert_eq!(
        render(&configuration).unwrap(),
        "backend web\n    mode http\n    server s1 10.0.0.1 port 8080\n"
    );
}
