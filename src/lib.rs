pub mod cli;
pub mod front;
pub mod model_download;
pub mod pipeline;
pub mod signs;
pub mod types;
pub mod word;
