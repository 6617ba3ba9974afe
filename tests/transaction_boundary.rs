//! Transaction Boundary Tests
//!
//! Transactions are plain data: metadata bounds are validated at
//! construction and on deserialization, and mutation order is kept.

use replaystore::containers::DictionaryMutation;
use replaystore::{Keyed, Transaction, TransactionError, TransactionMeta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    sku: String,
    qty: u32,
}

impl Keyed for Item {
    type Key = String;

    fn key(&self) -> String {
        self.sku.clone()
    }
}

#[test]
fn test_end_before_begin_cannot_be_built() {
    assert!(matches!(
        TransactionMeta::new(1000, 500),
        Err(TransactionError::EndBeforeBegin {
            begin_us: 1000,
            end_us: 500
        })
    ));

    let parsed = serde_json::from_str::<Transaction<DictionaryMutation<Item>>>(
        r#"{"meta":{"begin_us":1000,"end_us":500,"fields":{}},"mutations":[]}"#,
    );
    assert!(parsed.is_err());
}

#[test]
fn test_batch_survives_serialization_in_order() {
    let mut meta = TransactionMeta::started_at(1_000);
    meta.annotate("origin", "checkout");

    let mut tx = Transaction::new(meta);
    tx.record(DictionaryMutation::Insert {
        record: Item {
            sku: "a-1".to_string(),
            qty: 2,
        },
    });
    tx.record(DictionaryMutation::Erase {
        key: "b-7".to_string(),
    });
    tx.meta.finish(1_250).unwrap();

    let json = serde_json::to_string(&tx).unwrap();
    let back: Transaction<DictionaryMutation<Item>> = serde_json::from_str(&json).unwrap();

    assert_eq!(back.len(), 2);
    assert!(back.meta.is_valid());
    assert_eq!(back.meta.duration_us(), Some(250));
    assert_eq!(back.meta.field("origin"), Some("checkout"));
    assert!(matches!(back.mutations()[0], DictionaryMutation::Insert { .. }));
    assert!(matches!(back.mutations()[1], DictionaryMutation::Erase { ref key } if key == "b-7"));
}
