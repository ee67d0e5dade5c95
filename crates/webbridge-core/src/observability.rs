//! tracing subscriber の初期化
//!
//! stdout はブリッジの reply に使うので、ログは stderr に出します。

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` があればそれを、なければ `fallback` をフィルタに使う
///
/// 2 回目以降の呼び出しは何もしません。
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        tracing::debug!("tracing already initialised: {err}");
    }
}
