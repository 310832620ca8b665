//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    address_word, bool_word, build_test_config, build_test_config_with_timeout, build_test_engine,
    mount_balance, mount_call, mount_receipt_pending, mount_receipt_revert, mount_receipt_success,
    mount_send_raw, mount_send_raw_expect, mount_transaction_count, seed_catalog, u256_word,
    TestEngine, DUMMY_BUYER_ADDR, DUMMY_BYTECODE, DUMMY_CONTRACT_ADDR, DUMMY_COURIER_ADDR,
    DUMMY_OPERATOR_KEY, DUMMY_TX_HASH,
};
