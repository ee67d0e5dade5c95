//! WebContentFileBridge - embedded web content 向けのファイル書き込み
//!
//! # 操作
//! - `write_private_file`: base64 を decode して private root 配下に書く
//! - `write_public_download`: UTF-8 テキストを Downloads の新しいエントリに書く
//!
//! どちらも `WriteResult` を返し、失敗は warn ログを出したうえで呼び出し元に返します。
//! リトライはしません（呼び出し元が必要なら再実行する）。

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::{
    BridgeError, DisplayName, DownloadEntry, NewDownload, RelativePath, WriteReceipt, WriteRequest,
    WriteResult,
};
use crate::ports::{DownloadCollection, PrivateStore};

use super::call::{BridgeCall, BridgeReply};

pub const DEFAULT_MIME_TYPE: &str = "application/json";
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// 標準 alphabet。末尾の `=` はあってもなくてもよい
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub download_mime_type: String,
    /// decode 後のバイト数の上限
    pub max_payload_bytes: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            download_mime_type: DEFAULT_MIME_TYPE.to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// WebContentFileBridge はスクリプトからの書き込み要求をホストのストレージに反映する
///
/// # 使用例
/// ```ignore
/// let bridge = WebContentFileBridge::new(
///     FsPrivateStore::new("/data/files"),
///     FsDownloadCollection::system("/storage", "Download/"),
/// );
/// let receipt = bridge.write_private_file("save/file1.rpgsave", "SGVsbG8=").await?;
/// ```
///
/// ホスト側の依存（PrivateStore, DownloadCollection）はコンストラクタで受け取り、
/// ブリッジの生存期間中保持します。呼び出しをまたいだ状態は持ちません。
pub struct WebContentFileBridge<P, D> {
    private: P,
    downloads: D,
    settings: BridgeSettings,
}

impl<P: PrivateStore, D: DownloadCollection> WebContentFileBridge<P, D> {
    pub fn new(private: P, downloads: D) -> Self {
        Self {
            private,
            downloads,
            settings: BridgeSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BridgeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn downloads(&self) -> &D {
        &self.downloads
    }

    /// base64 の payload を `<private root>/<relative_path>` に書く
    ///
    /// 検証（パス → decode → サイズ）はすべて I/O より前に行うので、
    /// 失敗した場合はファイルもディレクトリも作られません。
    pub async fn write_private_file(&self, relative_path: &str, encoded_payload: &str) -> WriteResult {
        debug!(relative_path, encoded_len = encoded_payload.len(), "saveBase64File");
        let result = self.try_write_private(relative_path, encoded_payload).await;
        log_result("saveBase64File", relative_path, &result);
        result
    }

    /// テキストを Downloads コレクションの新しいエントリに書く
    ///
    /// 同じ名前で呼ぶたびに別のエントリができます（上書きしない）。
    pub async fn write_public_download(&self, file_name: &str, text_payload: &str) -> WriteResult {
        debug!(file_name, len = text_payload.len(), "saveToDownloads");
        let result = self.try_write_download(file_name, text_payload).await;
        log_result("saveToDownloads", file_name, &result);
        result
    }

    pub async fn handle(&self, request: WriteRequest) -> WriteResult {
        match request {
            WriteRequest::PrivateFile { relative_path, payload } => {
                self.write_private_file(&relative_path, &payload).await
            }
            WriteRequest::DownloadFile { file_name, payload } => {
                self.write_public_download(&file_name, &payload).await
            }
        }
    }

    /// スクリプト境界の入口。失敗も必ず reply に入れて返す
    pub async fn invoke(&self, call: &BridgeCall) -> BridgeReply {
        match call.to_request() {
            Ok(request) => BridgeReply::from(&self.handle(request).await),
            Err(err) => {
                warn!(method = %call.method, kind = ?err.kind(), error = %err, "rejected bridge call");
                BridgeReply::failure(&err)
            }
        }
    }

    async fn try_write_private(&self, relative_path: &str, encoded_payload: &str) -> WriteResult {
        let path = RelativePath::parse(relative_path)?;
        let bytes = decode_payload(encoded_payload)?;
        self.check_size(bytes.len())?;

        let written = self.private.write(&path, &bytes).await?;
        Ok(WriteReceipt::Private {
            path: written,
            size: bytes.len() as u64,
        })
    }

    async fn try_write_download(&self, file_name: &str, text_payload: &str) -> WriteResult {
        let display_name = DisplayName::parse(file_name)?;
        let bytes = text_payload.as_bytes();
        self.check_size(bytes.len())?;

        let mut entry = self
            .downloads
            .register(NewDownload {
                display_name,
                mime_type: self.settings.download_mime_type.clone(),
            })
            .await?;

        if let Err(err) = self.write_entry(&entry, bytes).await {
            if let Err(cleanup) = self.downloads.discard(&entry).await {
                warn!(uri = %entry.uri, error = %cleanup, "failed to discard partial download entry");
            }
            return Err(err);
        }

        entry.size = bytes.len() as u64;
        Ok(WriteReceipt::Download { entry })
    }

    async fn write_entry(&self, entry: &DownloadEntry, bytes: &[u8]) -> Result<(), BridgeError> {
        let io_err = |source| BridgeError::Io {
            target: entry.uri.to_string(),
            source,
        };
        // writer はこの関数を抜けるとき（エラー時も）解放される
        let mut writer = self.downloads.open_writer(entry).await?;
        writer.write_all(bytes).await.map_err(io_err)?;
        writer.shutdown().await.map_err(io_err)?;
        Ok(())
    }

    fn check_size(&self, size: usize) -> Result<(), BridgeError> {
        let limit = self.settings.max_payload_bytes;
        if size > limit {
            return Err(BridgeError::PayloadTooLarge { size, limit });
        }
        Ok(())
    }
}

/// 改行などの ASCII 空白は取り除いてから decode する
fn decode_payload(encoded: &str) -> Result<Vec<u8>, BridgeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(PAYLOAD_ENGINE.decode(compact.as_bytes())?)
}

fn log_result(method: &'static str, subject: &str, result: &WriteResult) {
    match result {
        Ok(receipt) => {
            info!(method, subject, location = %receipt.location(), bytes = receipt.size(), "write completed")
        }
        Err(err) => warn!(method, subject, kind = ?err.kind(), error = %err, "write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::impls::{DEFAULT_COLLECTION, FsDownloadCollection, FsPrivateStore, InMemoryDownloadCollection};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::io;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use tokio::io::AsyncWrite;

    /// 書き込みが必ず失敗するエントリの writer
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on volume")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// 登録はできるが書き込めないコレクション。discard の回数を数える
    #[derive(Default)]
    struct FullVolumeCollection {
        inner: InMemoryDownloadCollection,
        discarded: AtomicUsize,
    }

    #[async_trait]
    impl DownloadCollection for FullVolumeCollection {
        type Writer = BrokenWriter;

        async fn register(&self, request: NewDownload) -> Result<DownloadEntry, BridgeError> {
            self.inner.register(request).await
        }

        async fn open_writer(&self, _entry: &DownloadEntry) -> Result<BrokenWriter, BridgeError> {
            Ok(BrokenWriter)
        }

        async fn discard(&self, entry: &DownloadEntry) -> Result<(), BridgeError> {
            self.discarded.fetch_add(1, Ordering::SeqCst);
            self.inner.discard(entry).await
        }
    }

    type MemoryBridge = WebContentFileBridge<FsPrivateStore, InMemoryDownloadCollection>;

    fn memory_bridge(root: &Path) -> MemoryBridge {
        WebContentFileBridge::new(FsPrivateStore::new(root), InMemoryDownloadCollection::new())
    }

    fn encode(bytes: &[u8]) -> String {
        PAYLOAD_ENGINE.encode(bytes)
    }

    fn is_empty_dir(path: &Path) -> bool {
        !path.exists() || std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"Hello".as_slice())]
    #[case(&[0u8, 159, 146, 150, 255])]
    #[case(br#"{"party":[1,2,3],"gold":100}"#.as_slice())]
    #[tokio::test]
    async fn private_file_holds_decoded_bytes(#[case] payload: &[u8]) {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let receipt = bridge.write_private_file("save/file1.rpgsave", &encode(payload)).await.unwrap();

        let WriteReceipt::Private { path, size } = receipt else {
            panic!("expected a private receipt");
        };
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert_eq!(size, payload.len() as u64);
        assert!(path.ends_with("save/file1.rpgsave"));
    }

    #[tokio::test]
    async fn private_file_creates_intermediate_directories() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        bridge.write_private_file("a/b/c.bin", &encode(b"abc")).await.unwrap();

        assert!(root.path().join("a/b").is_dir());
        assert_eq!(std::fs::read(root.path().join("a/b/c.bin")).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn private_file_is_overwritten_not_appended() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        bridge.write_private_file("save/file1.rpgsave", &encode(b"first payload")).await.unwrap();
        bridge.write_private_file("save/file1.rpgsave", &encode(b"second")).await.unwrap();

        assert_eq!(std::fs::read(root.path().join("save/file1.rpgsave")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn line_wrapped_base64_is_accepted() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        bridge.write_private_file("wrapped.bin", "SGVs\nbG8g\r\nd29y bGQ=\n").await.unwrap();

        assert_eq!(std::fs::read(root.path().join("wrapped.bin")).unwrap(), b"Hello world");
    }

    #[rstest]
    #[case("../../etc/x")]
    #[case("save/../../x")]
    #[case("/etc/passwd")]
    #[case("")]
    #[tokio::test]
    async fn traversal_is_rejected_before_io(#[case] relative_path: &str) {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("files");
        let bridge = memory_bridge(&root);

        let err = bridge.write_private_file(relative_path, &encode(b"x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(!root.exists());
        assert!(!parent.path().join("x").exists());
    }

    #[rstest]
    #[case("not base64!!")]
    #[case("SGVsbG8=!")]
    #[case("%%%%")]
    #[case("SGVsb")]
    #[tokio::test]
    async fn malformed_base64_creates_nothing(#[case] encoded: &str) {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let err = bridge.write_private_file("save/file1.rpgsave", encoded).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DecodeError);
        assert!(is_empty_dir(root.path()));
    }

    #[rstest]
    #[case("SGVsbG8", b"Hello".as_slice())]
    #[case("SGVsbG8=", b"Hello".as_slice())]
    #[case("SGk", b"Hi".as_slice())]
    #[tokio::test]
    async fn padding_is_optional(#[case] encoded: &str, #[case] expected: &[u8]) {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let receipt = bridge.write_private_file("save/x.bin", encoded).await.unwrap();

        assert_eq!(std::fs::read(receipt.location()).unwrap(), expected);
    }

    #[tokio::test]
    async fn failed_entry_write_discards_the_entry() {
        let root = tempfile::tempdir().unwrap();
        let bridge = WebContentFileBridge::new(FsPrivateStore::new(root.path()), FullVolumeCollection::default());

        let err = bridge.write_public_download("notes.json", "{\"a\":1}").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(err.to_string().contains("no space left on volume"));
        assert_eq!(bridge.downloads().discarded.load(Ordering::SeqCst), 1);
        assert!(bridge.downloads().inner.is_empty());
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path()).with_settings(BridgeSettings {
            max_payload_bytes: 4,
            ..BridgeSettings::default()
        });

        let err = bridge.write_private_file("big.bin", &encode(b"12345")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);

        let err = bridge.write_public_download("big.json", "12345").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);

        assert!(is_empty_dir(root.path()));
        assert!(bridge.downloads().is_empty());
    }

    #[tokio::test]
    async fn download_content_reads_back_as_utf8() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let receipt = bridge.write_public_download("notes.json", "{\"a\":1}").await.unwrap();

        let WriteReceipt::Download { entry } = receipt else {
            panic!("expected a download receipt");
        };
        assert_eq!(entry.display_name, "notes.json");
        assert_eq!(entry.mime_type, "application/json");
        assert_eq!(entry.relative_path, "Download/");
        assert_eq!(entry.size, 7);
        assert_eq!(bridge.downloads().contents(&entry.uri).unwrap(), "{\"a\":1}".as_bytes());
    }

    #[tokio::test]
    async fn repeated_downloads_create_distinct_entries() {
        let volume = tempfile::tempdir().unwrap();
        let private = tempfile::tempdir().unwrap();
        let bridge = WebContentFileBridge::new(
            FsPrivateStore::new(private.path()),
            FsDownloadCollection::system(volume.path(), DEFAULT_COLLECTION),
        );

        let first = bridge.write_public_download("notes.json", "{\"v\":1}").await.unwrap();
        let second = bridge.write_public_download("notes.json", "{\"v\":2}").await.unwrap();

        assert_ne!(first.location(), second.location());
        let dir = volume.path().join("Download");
        assert_eq!(std::fs::read_to_string(dir.join("notes.json")).unwrap(), "{\"v\":1}");
        assert_eq!(std::fs::read_to_string(dir.join("notes (1).json")).unwrap(), "{\"v\":2}");
    }

    #[tokio::test]
    async fn registration_failure_is_surfaced() {
        let root = tempfile::tempdir().unwrap();
        let bridge = WebContentFileBridge::new(
            FsPrivateStore::new(root.path()),
            InMemoryDownloadCollection::rejecting("volume is read-only"),
        );

        let err = bridge.write_public_download("notes.json", "{}").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RegistrationError);
    }

    #[rstest]
    #[case("")]
    #[case("../notes.json")]
    #[case("Download/notes.json")]
    #[tokio::test]
    async fn bad_download_names_are_rejected(#[case] file_name: &str) {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let err = bridge.write_public_download(file_name, "{}").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(bridge.downloads().is_empty());
    }

    #[tokio::test]
    async fn handle_routes_both_request_kinds() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let private = bridge
            .handle(WriteRequest::private_file("save/config.rpgsave", encode(b"cfg")))
            .await
            .unwrap();
        let download = bridge
            .handle(WriteRequest::download_file("export.json", "[]"))
            .await
            .unwrap();

        assert!(matches!(private, WriteReceipt::Private { .. }));
        assert!(matches!(download, WriteReceipt::Download { .. }));
    }

    #[tokio::test]
    async fn invoke_reports_every_outcome() {
        let root = tempfile::tempdir().unwrap();
        let bridge = memory_bridge(root.path());

        let ok = bridge
            .invoke(&BridgeCall::from_json(r#"{"method":"saveToDownloads","args":["a.json","{}"]}"#).unwrap())
            .await;
        assert!(ok.ok);
        assert!(ok.location.unwrap().starts_with("content://downloads/"));

        let decode = bridge
            .invoke(&BridgeCall::from_json(r#"{"method":"saveBase64File","args":["x.bin","%%%"]}"#).unwrap())
            .await;
        assert!(!decode.ok);
        assert_eq!(decode.error.unwrap().kind, ErrorKind::DecodeError);

        let unknown = bridge
            .invoke(&BridgeCall::from_json(r#"{"method":"readFile","args":["x.bin"]}"#).unwrap())
            .await;
        assert_eq!(unknown.error.unwrap().kind, ErrorKind::InvalidCall);
    }
}
