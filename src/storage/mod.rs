// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod memory_store;
pub mod record_store;
pub mod stored_record;
pub mod supabase;

// Re-export main types for convenience
pub use memory_store::InMemoryRecordStore;
pub use record_store::{record_row, PersistenceError, RecordStore};
pub use stored_record::{StoredDetection, StoredRecord};
pub use supabase::SupabaseRecordStore;
