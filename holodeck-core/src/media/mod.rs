pub mod ytdlp;

pub use ytdlp::YtDlpAcquirer;
