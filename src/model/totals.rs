//! Derived money figures for an invoice.
//!
//! Amounts are GST-inclusive. When GST applies, the tax component of an amount is one eleventh of
//! it (10% on top of the net), otherwise there is no tax component and the net is the amount.

use crate::model::{Amount, ItemId, LineItem};
use serde::Serialize;

/// The divisor for extracting 10% GST from a GST-inclusive amount.
const GST_DIVISOR: u32 = 11;

/// The derived figures for one line item.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemTotals {
    pub id: ItemId,
    pub gross: Amount,
    pub gst: Amount,
    pub net: Amount,
}

/// The derived figures for a whole invoice.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    pub gross: Amount,
    pub gst: Amount,
    pub net: Amount,
    /// One entry per item, in item order.
    pub items: Vec<ItemTotals>,
}

impl Totals {
    pub fn item(&self, id: ItemId) -> Option<&ItemTotals> {
        self.items.iter().find(|t| t.id == id)
    }
}

/// Splits a single GST-inclusive amount into `(gst, net)`.
pub fn split_gst(amount: Amount, gst_exempt: bool) -> (Amount, Amount) {
    if gst_exempt {
        (Amount::ZERO, amount)
    } else {
        let gst = amount / GST_DIVISOR;
        (gst, amount - gst)
    }
}

/// Computes the gross total and the per-item GST and net. Each item's amount is normalized once
/// here, so unparsable amounts contribute zero.
pub fn compute_totals<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
    gst_exempt: bool,
) -> Totals {
    let items: Vec<ItemTotals> = items
        .into_iter()
        .map(|item| {
            let gross = item.amount();
            let (gst, net) = split_gst(gross, gst_exempt);
            ItemTotals {
                id: item.id(),
                gross,
                gst,
                net,
            }
        })
        .collect();

    Totals {
        gross: items.iter().map(|t| t.gross).sum(),
        gst: items.iter().map(|t| t.gst).sum(),
        net: items.iter().map(|t| t.net).sum(),
        items,
    }
}
