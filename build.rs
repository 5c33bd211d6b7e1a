fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    // Messages are hand-written prost types in src/grpc/messages.rs, so the
    // service stubs are described here instead of in a .proto file.
    let session = tonic_build::manual::Service::builder()
        .name("Session")
        .package("gatekeeper.v1")
        .method(unary("login", "Login", "LoginRequest", "LoginResponse"))
        .method(unary("status", "Status", "StatusRequest", "StatusResponse"))
        .build();

    let secure = tonic_build::manual::Service::builder()
        .name("Secure")
        .package("gatekeeper.v1")
        .method(unary("greet", "Greet", "GreetRequest", "GreetResponse"))
        .method(unary("logout", "Logout", "LogoutRequest", "LogoutResponse"))
        .build();

    tonic_build::manual::Builder::new()
        .build_client(false)
        .compile(&[session, secure]);

    Ok(())
}

fn unary(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::Method {
    tonic_build::manual::Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::grpc::messages::{}", input))
        .output_type(format!("crate::grpc::messages::{}", output))
        .codec_path("tonic::codec::ProstCodec")
        .build()
}
