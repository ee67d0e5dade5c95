//! EntryIdGenerator port - エントリ ID 生成の抽象化
//!
//! # 実装
//! - **UlidEntryIdGenerator**: ULID ベース（時刻でソート可能）

use crate::domain::EntryId;
use crate::ports::Clock;
use ulid::Ulid;

/// EntryIdGenerator は Downloads エントリの ID を生成
///
/// 同名のファイルを何度登録しても、ID（と content URI）は毎回異なります。
pub trait EntryIdGenerator: Send + Sync {
    fn generate_entry_id(&self) -> EntryId;
}

/// Clock の時刻 + ランダム部分で ULID を作る
pub struct UlidEntryIdGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidEntryIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> EntryIdGenerator for UlidEntryIdGenerator<C> {
    fn generate_entry_id(&self) -> EntryId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        EntryId::from_ulid(ulid)
    }
}
