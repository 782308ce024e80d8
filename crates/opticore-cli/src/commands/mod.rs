pub mod banner;
pub mod classify;
pub mod describe;
pub mod report;
pub mod status;
pub mod submit;
