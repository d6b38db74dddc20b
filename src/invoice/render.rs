use crate::database::models::{InvoiceLineItem, InvoiceRecord, UserProfile};
use crate::utils::format::{format_currency, format_date_key, format_hours};

const STYLE: &str = r#"
      body { font-family: -apple-system, Arial, sans-serif; padding: 24px; color: #111; }
      h1 { margin-bottom: 4px; }
      .muted { color: #666; font-size: 12px; }
      .section { margin-top: 24px; }
      table { width: 100%; border-collapse: collapse; margin-top: 12px; }
      th, td { border-bottom: 1px solid #ddd; padding: 8px; font-size: 12px; }
      th { text-align: left; background: #f4f4f4; }
      .num { text-align: right; }
      .totals { margin-top: 16px; width: 100%; }
      .totals td { border: none; text-align: right; }
      .totals .grand td { font-weight: bold; }
"#;

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_row(item: &InvoiceLineItem) -> String {
    let description = if item.description.trim().is_empty() {
        "-".to_string()
    } else {
        escape_html(&item.description)
    };

    format!(
        "        <tr>\n          <td>{}</td>\n          <td>{}</td>\n          <td class=\"num\">{}</td>\n          <td class=\"num\">{}</td>\n          <td class=\"num\">{}</td>\n        </tr>\n",
        format_date_key(&item.date),
        description,
        format_hours(item.hours),
        format_currency(item.rate),
        format_currency(item.line_total)
    )
}

/// Renders a printable HTML invoice.
///
/// Figures come straight from the stored record; nothing is recomputed.
pub fn render_invoice_document(profile: &UserProfile, record: &InvoiceRecord) -> String {
    let rows: String = record.items.iter().map(render_row).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Invoice #{number}</title>
    <style>{style}</style>
  </head>
  <body>
    <h1>Invoice #{number}</h1>
    <div class="muted">Issue date: {issue_date}</div>
    <div class="muted">Period: {period_start} - {period_end}</div>

    <div class="section">
      <strong>{full_name}</strong><br />
      {address}<br />
      {email} · {phone}<br />
      ABN: {abn}
    </div>

    <div class="section">
      <table>
        <thead>
          <tr>
            <th>Date</th>
            <th>Description</th>
            <th class="num">Hours</th>
            <th class="num">Rate</th>
            <th class="num">Line total</th>
          </tr>
        </thead>
        <tbody>
{rows}        </tbody>
      </table>

      <table class="totals">
        <tr><td>Subtotal:</td><td>{subtotal}</td></tr>
        <tr><td>GST (10%):</td><td>{gst}</td></tr>
        <tr class="grand"><td>Total:</td><td>{total}</td></tr>
      </table>
    </div>
  </body>
</html>
"#,
        number = record.number,
        style = STYLE,
        issue_date = format_date_key(&record.issue_date),
        period_start = format_date_key(&record.period_start),
        period_end = format_date_key(&record.period_end),
        full_name = escape_html(&profile.full_name),
        address = escape_html(&profile.address),
        email = escape_html(&profile.email),
        phone = escape_html(&profile.phone),
        abn = escape_html(&profile.abn),
        rows = rows,
        subtotal = format_currency(record.subtotal),
        gst = format_currency(record.gst_amount),
        total = format_currency(record.total),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::DateKey;

    fn key(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Alex Doe".to_string(),
            email: "alex@example.com".to_string(),
            address: "1 Example St, Sydney".to_string(),
            phone: "0400 000 000".to_string(),
            abn: "12 345 678 901".to_string(),
            hourly_rate: 85.0,
        }
    }

    fn item(date: &str, description: &str, hours: f64) -> InvoiceLineItem {
        InvoiceLineItem {
            date: key(date),
            description: description.to_string(),
            hours,
            rate: 85.0,
            line_total: hours * 85.0,
        }
    }

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            number: 7,
            issue_date: key("2024-08-23"),
            period_start: key("2024-08-19"),
            period_end: key("2024-08-25"),
            items: vec![
                item("2024-08-19", "Design review", 7.5),
                item("2024-08-20", "", 8.0),
                item("2024-08-21", "Build", 7.0),
            ],
            subtotal: 1912.5,
            gst_included: true,
            gst_amount: 191.25,
            total: 2103.75,
            document_uri: None,
        }
    }

    #[test]
    fn document_contains_header_issuer_rows_and_totals() {
        let html = render_invoice_document(&profile(), &record());

        assert!(html.contains("<h1>Invoice #7</h1>"));
        assert!(html.contains("Issue date: Fri, 23 Aug 2024"));
        assert!(html.contains("Period: Mon, 19 Aug 2024 - Sun, 25 Aug 2024"));
        assert!(html.contains("<strong>Alex Doe</strong>"));
        assert!(html.contains("alex@example.com · 0400 000 000"));
        assert!(html.contains("ABN: 12 345 678 901"));
        assert_eq!(html.matches("<td>Mon, 19 Aug 2024</td>").count(), 1);
        assert!(html.contains("<td class=\"num\">7.50</td>"));
        assert!(html.contains("<td class=\"num\">$637.50</td>"));
        assert!(html.contains("<td>Subtotal:</td><td>$1,912.50</td>"));
        assert!(html.contains("<td>GST (10%):</td><td>$191.25</td>"));
        assert!(html.contains("<td>Total:</td><td>$2,103.75</td>"));
    }

    #[test]
    fn empty_description_renders_as_dash() {
        let html = render_invoice_document(&profile(), &record());
        assert!(html.contains("<td>-</td>"));
    }

    #[test]
    fn stored_totals_are_rendered_verbatim() {
        let mut inconsistent = record();
        inconsistent.subtotal = 10.0;
        inconsistent.gst_amount = 0.0;
        inconsistent.total = 99.99;

        let html = render_invoice_document(&profile(), &inconsistent);

        assert!(html.contains("<td>Subtotal:</td><td>$10.00</td>"));
        assert!(html.contains("<td>Total:</td><td>$99.99</td>"));
        assert!(!html.contains("$2,103.75"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut profile = profile();
        profile.full_name = "Alex <script>".to_string();
        let mut record = record();
        record.items[0].description = "R&D \"spike\"".to_string();

        let html = render_invoice_document(&profile, &record);

        assert!(html.contains("Alex &lt;script&gt;"));
        assert!(html.contains("R&amp;D &quot;spike&quot;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn rendering_twice_gives_the_same_document() {
        let record = record();
        assert_eq!(
            render_invoice_document(&profile(), &record),
            render_invoice_document(&profile(), &record)
        );
    }
}
