pub mod params;
pub mod schema;

pub use params::{ParamDef, Params};
pub use schema::{
    AuthConfig, BrowserConfig, Config, ExtractConfig, OnFailure, OutputConfig, SessionConfig,
    TargetUrl, Viewport,
};
