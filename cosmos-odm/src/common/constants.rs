// document constants
pub const ID_PROPERTY_NAME: &str = "id";
pub const SYSTEM_RID: &str = "_rid";
pub const SYSTEM_SELF: &str = "_self";
pub const SYSTEM_ETAG: &str = "_etag";
pub const SYSTEM_ATTACHMENTS: &str = "_attachments";
pub const SYSTEM_TIMESTAMP: &str = "_ts";
pub const SYSTEM_PROPERTIES: [&str; 5] = [
    SYSTEM_RID,
    SYSTEM_SELF,
    SYSTEM_ETAG,
    SYSTEM_ATTACHMENTS,
    SYSTEM_TIMESTAMP,
];

// query constants
pub const ROOT_ALIAS: &str = "r";
pub const PARAMETER_PREFIX: &str = "@param";

// paging constants
pub const DEFAULT_PAGE_SIZE: usize = 100;

// container constants
pub const DEFAULT_REQUEST_UNITS: u32 = 400;
pub const PARTITION_KEY_PATH_PREFIX: &str = "/";
