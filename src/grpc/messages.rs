//! Protobuf messages for the `gatekeeper.v1` services.

use std::fmt;

/// Credentials presented to `Session.Login`.
#[derive(Clone, PartialEq, ::prost::Message)]
#[prost(skip_debug)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub username: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub password: ::prost::alloc::string::String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A freshly issued token.
#[derive(Clone, PartialEq, ::prost::Message)]
#[prost(skip_debug)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub status: ::prost::alloc::string::String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusResponse {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GreetRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GreetResponse {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogoutRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogoutResponse {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_login_request_wire_format() {
        let request = LoginRequest {
            username: "user1".to_string(),
            password: "password123".to_string(),
        };
        let bytes = request.encode_to_vec();
        // field 1, length-delimited, "user1"
        assert_eq!(&bytes[..7], &[0x0a, 5, b'u', b's', b'e', b'r', b'1']);
        assert_eq!(LoginRequest::decode(bytes.as_slice()).unwrap(), request);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request = LoginRequest {
            username: "user1".to_string(),
            password: "password123".to_string(),
        };
        let rendered = format!("{:?}", request);
        assert!(rendered.contains("user1"));
        assert!(!rendered.contains("password123"));

        let response = LoginResponse {
            token: "abc.def.ghi".to_string(),
            status: "ok".to_string(),
        };
        assert!(!format!("{:?}", response).contains("abc.def.ghi"));
    }
}
