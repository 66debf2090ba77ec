pub(crate) mod analyze;
pub(crate) mod auth;
pub(crate) mod limits;
pub(crate) mod meta;
pub(crate) mod scan;
pub(crate) mod shared;
