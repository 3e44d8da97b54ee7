mod image_store_port;
mod media_source_port;
mod url_cache_port;

pub use image_store_port::ImageStorePort;
pub use media_source_port::MediaSourcePort;
pub use url_cache_port::UrlCachePort;
