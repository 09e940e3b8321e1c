pub mod api_sink;
pub mod fetcher;
pub mod pedant;
pub mod zoon;

pub use api_sink::ApiSink;
pub use fetcher::ReqwestFetcher;
pub use pedant::{PedantParser, PriceSelectors};
pub use zoon::ZoonParser;
