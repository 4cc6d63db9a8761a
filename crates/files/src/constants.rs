/// Directory under the data directory that holds uploaded blobs.
pub const BLOBS_DIR_NAME: &str = "blobs";

/// URL path prefix under which stored blobs are served.
pub const PUBLIC_PHOTOS_PREFIX: &str = "photos";
