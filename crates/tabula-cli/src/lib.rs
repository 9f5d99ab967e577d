pub mod submit;
pub mod util;
