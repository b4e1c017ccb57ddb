//! Route paths.

pub const POST_AUTH_LOGIN: &str = "/api/system/authentication/login";
pub const GET_AUTH_REFRESH_TOKEN: &str = "/api/system/authentication/refresh-token";
pub const GET_AUTH_PAGE_PERMISSION: &str = "/api/system/authentication/page-permission";
pub const POST_AUTH_LOGOUT: &str = "/api/system/authentication/logout";
pub const GET_API_HEALTH: &str = "/api/health";
