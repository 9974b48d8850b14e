pub mod http;
pub mod oauth1;

pub use http::HttpSocialAuthClient;
