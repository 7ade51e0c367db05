//! Renders the invoice as a self-contained, printable A4 HTML document, and as a plain-text
//! summary for the terminal.

use crate::config::{BankDetails, Issuer};
use crate::export::RenderedDocument;
use crate::model::{
    format_currency, Customer, Invoice, ItemTotals, LineItem, LogoImage, Totals, DATE_FORMAT,
};

/// Everything on the page that does not come from the invoice itself.
#[derive(Debug, Clone, Copy)]
pub struct Letterhead<'a> {
    pub issuer: &'a Issuer,
    pub bank: &'a BankDetails,
    pub logo: Option<&'a LogoImage>,
}

fn esc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
@page {{ size: A4 portrait; margin: 0; }}
body {{ margin: 0; font-family: Inter, Helvetica, Arial, sans-serif; color: #1f2937; background: #fff; }}
.page {{ width: 210mm; min-height: 297mm; box-sizing: border-box; padding: 16mm; display: flex; flex-direction: column; justify-content: space-between; }}
.header {{ display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 14mm; }}
.header h1 {{ font-size: 48pt; font-weight: 900; letter-spacing: -2px; margin: 0; color: #111827; }}
.logo {{ width: 48mm; height: 24mm; display: flex; align-items: center; justify-content: flex-end; }}
.logo img {{ max-height: 100%; max-width: 100%; object-fit: contain; }}
.label {{ font-size: 7pt; font-weight: 700; color: #9ca3af; text-transform: uppercase; letter-spacing: 2px; margin: 0 0 3mm 0; }}
.grid {{ display: flex; gap: 16mm; margin-bottom: 12mm; }}
.grid > div {{ flex: 1; }}
.name {{ font-weight: 900; font-size: 12pt; color: #111827; margin: 0 0 1mm 0; }}
.address {{ font-size: 10pt; color: #6b7280; margin: 0; }}
.subject {{ display: flex; justify-content: space-between; padding: 5mm 0; border-top: 1px solid #f3f4f6; border-bottom: 1px solid #f3f4f6; margin-bottom: 10mm; }}
.subject .value {{ font-size: 14pt; font-weight: 900; color: #111827; margin: 0; }}
.right {{ text-align: right; }}
table {{ width: 100%; border-collapse: collapse; margin-bottom: 10mm; }}
th {{ font-size: 7pt; font-weight: 700; color: #9ca3af; text-transform: uppercase; letter-spacing: 2px; padding: 4mm 0; border-bottom: 2px solid #111827; text-align: left; }}
th.num, td.num {{ text-align: right; }}
td {{ padding: 4mm 0; font-size: 10pt; color: #6b7280; border-bottom: 1px solid #f9fafb; }}
td.description {{ font-weight: 900; color: #111827; }}
td.total {{ font-weight: 900; color: #111827; }}
.detail {{ display: block; font-weight: 400; font-size: 8pt; color: #9ca3af; }}
.grand {{ display: flex; justify-content: flex-end; padding-top: 6mm; border-top: 2px solid #111827; }}
.grand .value {{ font-size: 36pt; font-weight: 900; color: #111827; margin: 0; }}
.bank {{ background: #0f172a; color: #fff; border-radius: 8mm; padding: 10mm; }}
.bank .label {{ color: #60a5fa; }}
.bank .grid {{ flex-wrap: wrap; gap: 6mm 12mm; margin: 0; }}
.bank .grid > div {{ flex: 0 0 45%; }}
.bank .key {{ font-size: 7pt; font-weight: 700; color: #6b7280; text-transform: uppercase; letter-spacing: 1px; margin: 0 0 1mm 0; }}
.bank .val {{ font-size: 10pt; font-weight: 900; letter-spacing: 1px; margin: 0; }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

/// Renders the printable invoice. The output depends only on its inputs, so the same invoice
/// always renders the same document.
pub fn render_html(invoice: &Invoice, letterhead: Letterhead<'_>) -> RenderedDocument {
    let customer = invoice.customer();
    let totals = invoice.totals();
    let sections = [
        header(letterhead.logo),
        parties(letterhead.issuer, customer),
        subject(invoice),
        item_table(invoice, &totals),
        grand_total(&totals),
    ];
    let body = format!(
        r#"<div class="page"><div>{}</div>{}</div>"#,
        sections.concat(),
        bank_footer(letterhead.bank)
    );

    let title = format!("Invoice {} - {}", invoice.reference(), customer.display_name());
    let html = html_shell(&title, &body);
    RenderedDocument::new(title, html)
}

fn header(logo: Option<&LogoImage>) -> String {
    let logo = logo
        .map(|image| {
            format!(
                r#"<img src="{}" alt="{}"/>"#,
                image.data_uri(),
                esc(image.name())
            )
        })
        .unwrap_or_default();
    format!(r#"<div class="header"><h1>INVOICE</h1><div class="logo">{logo}</div></div>"#)
}

fn parties(issuer: &Issuer, customer: &Customer) -> String {
    let name_line_2 = if customer.name_line_2().is_empty() {
        String::new()
    } else {
        format!(r#"<p class="name">{}</p>"#, esc(customer.name_line_2()))
    };
    format!(
        r#"<div class="grid">
<div><p class="label">Issued By</p><p class="name">{}</p>
<p class="address">{}</p><p class="address">{}</p></div>
<div><p class="label">Billed To</p><p class="name">{}</p>{name_line_2}
<p class="address">{}</p><p class="address">{}</p></div>
</div>"#,
        esc(&issuer.name),
        esc(&issuer.address_line_1),
        esc(&issuer.address_line_2),
        esc(customer.name_line_1()),
        esc(customer.address_line_1()),
        esc(customer.address_line_2())
    )
}

fn subject(invoice: &Invoice) -> String {
    format!(
        r#"<div class="subject">
<div><p class="label">Subject</p><p class="value">{}</p></div>
<div class="right"><p class="label">Invoice Date</p><p class="value">{}</p>
<p class="address">{}</p></div>
</div>"#,
        esc(invoice.template().subject_line),
        invoice.date().format(DATE_FORMAT),
        esc(invoice.reference())
    )
}

fn item_table(invoice: &Invoice, totals: &Totals) -> String {
    let rows: String = invoice
        .items()
        .iter()
        .zip(&totals.items)
        .map(|(item, figures)| item_row(item, figures))
        .collect();
    format!(
        r#"<table><thead><tr><th>Description</th><th class="num">Unit Price</th>
<th class="num">GST</th><th class="num">Total</th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

fn item_row(item: &LineItem, figures: &ItemTotals) -> String {
    let mut detail = Vec::new();
    if !item.date().is_empty() {
        detail.push(esc(item.date()));
    }
    if !item.reference().is_empty() {
        detail.push(format!("Ref {}", esc(item.reference())));
    }
    let detail = if detail.is_empty() {
        String::new()
    } else {
        format!(r#"<span class="detail">{}</span>"#, detail.join(" · "))
    };
    format!(
        r#"<tr><td class="description">{}{detail}</td><td class="num">{}</td>
<td class="num">{}</td><td class="num total">{}</td></tr>"#,
        esc(item.description()),
        format_currency(figures.net),
        format_currency(figures.gst),
        format_currency(figures.gross)
    )
}

fn grand_total(totals: &Totals) -> String {
    format!(
        r#"<div class="grand"><div class="right"><p class="label">Grand Total Due</p>
<p class="value">{}</p></div></div>"#,
        format_currency(totals.gross)
    )
}

fn bank_footer(bank: &BankDetails) -> String {
    let fields = [
        ("Account Name", &bank.account_name),
        ("ABN", &bank.abn),
        ("BSB", &bank.bsb),
        ("Account Number", &bank.account_number),
    ]
    .into_iter()
    .map(|(key, value)| {
        format!(
            r#"<div><p class="key">{key}</p><p class="val">{}</p></div>"#,
            esc(value)
        )
    })
    .collect::<String>();
    format!(
        r#"<div class="bank"><p class="label">Remittance / Bank Details</p>
<div class="grid">{fields}</div></div>"#
    )
}

/// A plain-text view of the editor state: the selected customer, each item with its derived
/// figures, and the totals.
pub fn render_summary(invoice: &Invoice) -> String {
    let customer = invoice.customer();
    let template = invoice.template();
    let totals = invoice.totals();
    let gst = if template.gst_applies {
        "GST applies"
    } else {
        "no GST"
    };
    let logo = match invoice.logo() {
        Some(logo) if logo.is_upload() => "uploaded",
        Some(_) => "customer default",
        None => "none",
    };

    let mut lines = vec![
        format!(
            "Customer {}: {} ({gst})",
            customer.id(),
            customer.display_name()
        ),
        format!("Subject: {}  Logo: {logo}", template.subject_line),
        format!(
            "Invoice {} dated {}",
            invoice.reference(),
            invoice.date().format(DATE_FORMAT)
        ),
    ];
    if invoice.items().is_empty() {
        lines.push("  (no items)".to_string());
    }
    lines.extend(
        invoice
            .items()
            .iter()
            .zip(&totals.items)
            .map(|(item, figures)| summary_line(item, figures)),
    );
    lines.push(format!(
        "Total {}  (GST {}, net {})",
        format_currency(totals.gross),
        format_currency(totals.gst),
        format_currency(totals.net)
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn summary_line(item: &LineItem, figures: &ItemTotals) -> String {
    let mut parts = vec![format!("  [{}] {}", item.id(), item.description())];
    if !item.date().is_empty() {
        parts.push(item.date().to_string());
    }
    if !item.reference().is_empty() {
        parts.push(format!("ref {}", item.reference()));
    }
    parts.push(format!("amount {}", format_currency(figures.gross)));
    parts.push(format!("gst {}", format_currency(figures.gst)));
    parts.push(format!("net {}", format_currency(figures.net)));
    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{test_customers, CustomerId, ItemField};
    use chrono::{TimeZone, Utc};

    fn issuer() -> Issuer {
        Issuer {
            name: "Pat <Sole> Trader".to_string(),
            address_line_1: "1 Example St".to_string(),
            address_line_2: "Frankston VIC 3199".to_string(),
        }
    }

    fn bank() -> BankDetails {
        BankDetails {
            account_name: "Pat Trader".to_string(),
            abn: "11 222 333 444".to_string(),
            bsb: "111-222".to_string(),
            account_number: "1234 5678".to_string(),
        }
    }

    fn invoice() -> Invoice {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut invoice = Invoice::new(test_customers(), now);
        let id = invoice.add_item();
        invoice.update_item(id, ItemField::Amount, "143.48");
        invoice
    }

    #[test]
    fn test_render_html_gst_customer() {
        let (issuer, bank) = (issuer(), bank());
        let doc = render_html(
            &invoice(),
            Letterhead {
                issuer: &issuer,
                bank: &bank,
                logo: None,
            },
        );
        let html = doc.html();
        assert!(html.contains("Chargeback from PAD Thai Food"));
        assert!(html.contains("Quest Frankston"));
        assert!(html.contains("on the Bay"));
        assert!(html.contains("2026-10-16"));
        assert!(html.contains("$130.44"));
        assert!(html.contains("$13.04"));
        assert!(html.contains("$143.48"));
        assert!(html.contains("Pat &lt;Sole&gt; Trader"));
        assert!(html.contains("111-222"));
        assert!(!html.contains("<img"));
        assert!(doc.title().contains("Quest Frankston on the Bay"));
    }

    #[test]
    fn test_render_html_exempt_customer_skips_empty_name_line() {
        let (issuer, bank) = (issuer(), bank());
        let mut invoice = invoice();
        invoice.select_customer(CustomerId::new(2)).unwrap();
        let html = render_html(
            &invoice,
            Letterhead {
                issuer: &issuer,
                bank: &bank,
                logo: None,
            },
        )
        .html()
        .to_string();
        assert!(html.contains(">Rent<"));
        assert!(html.contains("$0.00"));
        assert!(!html.contains(r#"<p class="name"></p>"#));
    }

    #[test]
    fn test_render_html_embeds_logo_and_item_details() {
        let (issuer, bank) = (issuer(), bank());
        let logo = LogoImage::new("pad-logo.png", b"png".to_vec());
        let mut invoice = invoice();
        let id = invoice.add_item();
        invoice.update_item(id, ItemField::Date, "2026-10-01");
        invoice.update_item(id, ItemField::Reference, "CB-77");
        invoice.update_item(id, ItemField::Description, "<script>");
        let html = render_html(
            &invoice,
            Letterhead {
                issuer: &issuer,
                bank: &bank,
                logo: Some(&logo),
            },
        )
        .html()
        .to_string();
        assert!(html.contains(r#"src="data:image/png;base64,cG5n""#));
        assert!(html.contains("2026-10-01 · Ref CB-77"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_html_section_order() {
        let (issuer, bank) = (issuer(), bank());
        let html = render_html(
            &invoice(),
            Letterhead {
                issuer: &issuer,
                bank: &bank,
                logo: None,
            },
        )
        .html()
        .to_string();
        let positions: Vec<usize> = [
            "<h1>INVOICE</h1>",
            "Billed To",
            "Invoice Date",
            "<table>",
            "Grand Total Due",
            "Remittance / Bank Details",
        ]
        .iter()
        .map(|marker| html.find(marker).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(html.contains(r#"<p class="key">Account Number</p><p class="val">1234 5678</p>"#));
    }

    #[test]
    fn test_render_summary() {
        let mut invoice = invoice();
        let id = invoice.add_item();
        invoice.update_item(id, ItemField::Amount, "abc");
        let summary = render_summary(&invoice);
        assert!(summary.contains("Customer 1: Quest Frankston on the Bay (GST applies)"));
        assert!(summary.contains("Logo: customer default"));
        assert!(summary.contains("[1] Chargeback  amount $143.48  gst $13.04  net $130.44"));
        assert!(summary.contains("[2] Chargeback  amount $0.00"));
        assert!(summary.contains("Total $143.48  (GST $13.04, net $130.44)"));
    }

    #[test]
    fn test_esc() {
        assert_eq!(esc(r#"a&b<c>"d"'e"#), "a&amp;b&lt;c&gt;&quot;d&quot;&#39;e");
    }
}
