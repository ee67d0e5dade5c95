use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;
use webbridge_core::domain::BridgeMethod;
use webbridge_core::observability::init_tracing;
use webbridge_core::{BridgeCall, BridgeConfig, BridgeError, BridgeReply, FsBridge};

/// webbridge: ホスト側シェル
///
/// スクリプトからの呼び出しを JSON で受け取り、ブリッジに渡して reply を返す。
#[derive(Debug, Parser)]
#[command(name = "webbridge", version, about = "File persistence bridge for embedded web content")]
struct Cli {
    /// TOML 設定ファイル（省略時はデフォルト設定）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// stdin の JSON lines を 1 行 1 呼び出しとして処理し、reply を stdout に出す
    Serve,
    /// saveBase64File を 1 回実行
    SavePrivate { relative_path: String, base64_data: String },
    /// saveToDownloads を 1 回実行
    SaveDownload { file_name: String, json_data: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    init_tracing(&config.log_filter);

    let bridge = config.build_bridge()?;
    info!(
        private_root = %config.private_root.display(),
        downloads_root = %config.downloads_root.display(),
        collection = %config.downloads_collection,
        "bridge ready"
    );

    match cli.command {
        Command::Serve => {
            serve(&bridge, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::SavePrivate { relative_path, base64_data } => {
            let call = BridgeCall::new(BridgeMethod::SaveBase64File, [relative_path.as_str(), base64_data.as_str()]);
            one_shot(&bridge, &call).await
        }
        Command::SaveDownload { file_name, json_data } => {
            let call = BridgeCall::new(BridgeMethod::SaveToDownloads, [file_name.as_str(), json_data.as_str()]);
            one_shot(&bridge, &call).await
        }
    }
}

/// 1 行 = 1 呼び出し。解釈できない行（UTF-8 でない行も含む）にも INVALID_CALL の reply を返す
async fn serve<R, W>(bridge: &FsBridge, mut input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await.context("read input")? == 0 {
            break;
        }
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        let reply = match std::str::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match BridgeCall::from_json(line) {
                Ok(call) => bridge.invoke(&call).await,
                Err(err) => BridgeReply::failure(&err),
            },
            Err(e) => BridgeReply::failure(&BridgeError::InvalidCall(format!("line is not valid UTF-8: {e}"))),
        };
        let mut out = reply.to_json().context("encode reply")?;
        out.push('\n');
        output.write_all(out.as_bytes()).await.context("write output")?;
        output.flush().await.context("flush output")?;
    }
    Ok(())
}

async fn one_shot(bridge: &FsBridge, call: &BridgeCall) -> anyhow::Result<ExitCode> {
    let reply = bridge.invoke(call).await;
    println!("{}", reply.to_json().context("encode reply")?);
    Ok(if reply.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
