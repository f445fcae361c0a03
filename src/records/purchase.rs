use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{all_filled, Draft, NewRecord, Record};
use crate::store::Fields;

/// One line of a shopping list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "compras", order_by = "producto", draft = PurchaseDraft)]
#[serde(default, rename_all = "camelCase")]
pub struct Purchase {
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub producto: String,
    pub marca: String,
    pub cantidad: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PurchaseDraft {
    pub producto: String,
    pub marca: String,
    pub cantidad: String,
}

impl Draft for PurchaseDraft {
    type Record = Purchase;

    fn from_record(record: &Purchase) -> Self {
        Self {
            producto: record.producto.clone(),
            marca: record.marca.clone(),
            cantidad: record.cantidad.clone(),
        }
    }

    fn is_complete(&self) -> bool {
        all_filled(&[&self.producto, &self.marca, &self.cantidad])
    }

    // Purchases carry no creation timestamp.
    fn into_record(self, identity: NewRecord) -> Purchase {
        Purchase {
            owner_id: identity.owner_id,
            producto: self.producto,
            marca: self.marca,
            cantidad: self.cantidad,
            document_id: identity.document_id,
        }
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("producto".into(), Value::from(self.producto.as_str()));
        fields.insert("marca".into(), Value::from(self.marca.as_str()));
        fields.insert("cantidad".into(), Value::from(self.cantidad.as_str()));
        fields
    }
}
