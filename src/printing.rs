use std::io::{self, Write};

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, presets};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::amount::{Money, format_decimal};
use crate::notice::{Notice, Variant};
use crate::tree::{depth_style, indent};

/// Output format of the screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fmt {
    Tty,
    Json,
    Lisp,
}

pub mod accounts {
    use super::*;
    use crate::account::{Account, AccountType, Summary};
    use crate::group::{Expansion, Group};
    use crate::tree::{Node, VisibleRow};

    #[derive(Serialize)]
    struct GroupView<'a> {
        kind: AccountType,
        count: usize,
        total: Option<Money>,
        expanded: bool,
        accounts: &'a [&'a Account],
    }

    #[derive(Serialize)]
    struct AccountsView<'a> {
        summary: &'a Summary,
        groups: Vec<GroupView<'a>>,
    }

    #[derive(Serialize)]
    struct TreeRow<'a> {
        depth: usize,
        account: &'a Account,
        has_children: bool,
        expanded: bool,
    }

    /// With `tree` set the accounts are shown along their parent links
    /// instead of by type.
    pub fn print(
        out: impl Write,
        summary: &Summary,
        groups: &[Group<'_, AccountType, Account>],
        expansion: &Expansion<AccountType>,
        tree: Option<&[VisibleRow<'_, Node<'_, Account>>]>,
        fmt: Fmt,
    ) -> io::Result<()> {
        if let Some(rows) = tree {
            let rows: Vec<_> = rows
                .iter()
                .map(|r| TreeRow {
                    depth: r.depth,
                    account: r.node.record(),
                    has_children: r.has_children,
                    expanded: r.expanded,
                })
                .collect();
            return match fmt {
                Fmt::Tty => print_tree_tty(out, summary, &rows),
                _ => structured(out, &rows, fmt),
            };
        }

        match fmt {
            Fmt::Tty => print_tty(out, summary, groups, expansion),
            _ => {
                let view = AccountsView {
                    summary,
                    groups: groups
                        .iter()
                        .map(|g| GroupView {
                            kind: *g.key(),
                            count: g.len(),
                            total: g.total().ok(),
                            expanded: expansion.is_expanded(g.key()),
                            accounts: g.members(),
                        })
                        .collect(),
                };
                structured(out, &view, fmt)
            }
        }
    }

    fn summary_table(summary: &Summary) -> Table {
        let money = |d: Decimal| Money::new(d, summary.currency).to_string();

        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            ["Total Assets", "Total Liabilities", "Total Equity", "Net Income"].map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Right)
            }),
        );
        table.add_row(vec![
            Cell::new(money(summary.assets)).set_alignment(CellAlignment::Right),
            Cell::new(money(summary.liabilities))
                .fg(Color::DarkRed)
                .set_alignment(CellAlignment::Right),
            Cell::new(money(summary.equity)).set_alignment(CellAlignment::Right),
            Cell::new(money(summary.net_income))
                .fg(Color::DarkGreen)
                .set_alignment(CellAlignment::Right),
        ]);
        table
    }

    fn print_tty(
        mut out: impl Write,
        summary: &Summary,
        groups: &[Group<'_, AccountType, Account>],
        expansion: &Expansion<AccountType>,
    ) -> io::Result<()> {
        writeln!(out, "{}\n", summary_table(summary))?;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING);

        for g in groups {
            let expanded = expansion.is_expanded(g.key());
            let total = match g.total() {
                Ok(m) => m.to_string(),
                Err(e) => console::style(e.to_string()).red().to_string(),
            };

            table.add_row(vec![
                Cell::new(format!("{} {}", chevron(true, expanded), g.key()))
                    .add_attribute(Attribute::Bold),
                Cell::new(format!("{} accounts", g.len())).fg(Color::Grey),
                Cell::new(total)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Right),
            ]);

            if !expanded {
                continue;
            }
            for a in g.members() {
                table.add_row(vec![
                    account_name(a, 1),
                    Cell::new(a.number.as_deref().unwrap_or("")),
                    balance(a.balance_money()),
                ]);
            }
        }

        finish(out, &table)
    }

    fn print_tree_tty(mut out: impl Write, summary: &Summary, rows: &[TreeRow]) -> io::Result<()> {
        writeln!(out, "{}\n", summary_table(summary))?;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            ["Account", "Number", "Type", "Balance"].map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );

        for r in rows {
            table.add_row(vec![
                Cell::new(format!(
                    "{}{} {}",
                    indent(r.depth),
                    chevron(r.has_children, r.expanded),
                    r.account.name
                ))
                .fg(depth_style(r.depth).color),
                Cell::new(r.account.number.as_deref().unwrap_or("")),
                Cell::new(r.account.kind.to_string()),
                balance(r.account.balance_money()),
            ]);
        }

        finish(out, &table)
    }

    fn account_name(a: &Account, depth: usize) -> Cell {
        Cell::new(format!("{}{}", indent(depth), a.name))
            .fg(Color::DarkBlue)
            .set_alignment(CellAlignment::Left)
    }
}

pub mod inventory {
    use super::*;
    use crate::inventory::InventoryItem;
    use crate::tree::VisibleRow;

    #[derive(Serialize)]
    struct Row<'a> {
        depth: usize,
        has_children: bool,
        expanded: bool,
        id: &'a str,
        product_name: &'a str,
        sku: Option<&'a str>,
        status: &'a str,
        current_qty: u64,
        incoming: u64,
        usage: u64,
        out_of_stock: &'a str,
        orders_by: &'a str,
        weeks_stock: u32,
        lead: u32,
    }

    pub fn print(
        out: impl Write,
        rows: &[VisibleRow<'_, InventoryItem>],
        fmt: Fmt,
    ) -> io::Result<()> {
        let rows: Vec<_> = rows
            .iter()
            .map(|r| Row {
                depth: r.depth,
                has_children: r.has_children,
                expanded: r.expanded,
                id: &r.node.id,
                product_name: &r.node.product_name,
                sku: r.node.sku.as_deref(),
                status: &r.node.status,
                current_qty: r.node.current_qty,
                incoming: r.node.incoming,
                usage: r.node.usage,
                out_of_stock: &r.node.out_of_stock,
                orders_by: &r.node.orders_by,
                weeks_stock: r.node.weeks_stock,
                lead: r.node.lead,
            })
            .collect();

        match fmt {
            Fmt::Tty => print_tty(out, &rows),
            _ => structured(out, &rows, fmt),
        }
    }

    fn print_tty(out: impl Write, rows: &[Row]) -> io::Result<()> {
        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            [
                "", "Product Names", "SKU", "Status", "Current Qty / Stock", "Incoming", "Usage",
                "Out Of Stock", "Orders By", "Weeks Stock", "Lead",
            ]
            .map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );

        let num = |n: u64| Cell::new(n).set_alignment(CellAlignment::Right);
        for r in rows {
            let style = depth_style(r.depth);
            table.add_row(vec![
                Cell::new(format!(
                    "{}{} {}",
                    indent(r.depth),
                    chevron(r.has_children, r.expanded),
                    style.icon
                ))
                .fg(style.color),
                Cell::new(r.product_name),
                Cell::new(r.sku.unwrap_or("")),
                Cell::new(r.status),
                num(r.current_qty),
                num(r.incoming),
                num(r.usage),
                Cell::new(r.out_of_stock),
                Cell::new(r.orders_by),
                num(r.weeks_stock.into()),
                num(r.lead.into()),
            ]);
        }

        finish(out, &table)
    }
}

pub mod suppliers {
    use super::*;
    use crate::currency::Currency;
    use crate::filter::Page;
    use crate::supplier::Supplier;

    #[derive(Serialize)]
    struct SuppliersView<'a> {
        total_suppliers: usize,
        payable: &'a [Money],
        page: &'a Page<'a, Supplier>,
        summary: String,
    }

    /// `payable` holds one total per currency.
    pub fn print(
        mut out: impl Write,
        page: &Page<'_, Supplier>,
        total_suppliers: usize,
        payable: &[Money],
        fmt: Fmt,
    ) -> io::Result<()> {
        if fmt != Fmt::Tty {
            let view = SuppliersView {
                total_suppliers,
                payable,
                page,
                summary: page.to_string(),
            };
            return structured(out, &view, fmt);
        }

        let mut stats = Table::new();
        stats.load_preset(presets::NOTHING);
        let mut header = vec![Cell::new("Total Suppliers").add_attribute(Attribute::Bold)];
        let mut values = vec![Cell::new(total_suppliers)];
        for m in payable {
            header.push(
                Cell::new(format!("Total Payable ({})", m.currency))
                    .add_attribute(Attribute::Bold),
            );
            values.push(
                Cell::new(format_decimal(m.amount, 0))
                    .fg(Color::DarkRed)
                    .set_alignment(CellAlignment::Right),
            );
        }
        stats.set_header(header);
        stats.add_row(values);
        writeln!(out, "{}\n", stats)?;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            ["Name", "Email", "Phone", "Status", "Balance"].map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );

        for s in &page.rows {
            let bal = s
                .balance
                .map(|b| balance(Money::new(b, s.currency.unwrap_or_else(Currency::base))))
                .unwrap_or_else(|| Cell::new("-").set_alignment(CellAlignment::Right));
            table.add_row(vec![
                Cell::new(&s.name).fg(Color::DarkBlue),
                Cell::new(&s.email),
                Cell::new(&s.phone),
                Cell::new(s.status.as_deref().unwrap_or("")),
                bal,
            ]);
        }

        writeln!(out, "{}", table)?;
        writeln!(out, "{}", page)
    }
}

pub mod grns {
    use super::*;
    use crate::filter::Page;
    use crate::grn::GrnRecord;

    #[derive(Serialize)]
    struct GrnsView<'a> {
        page: &'a Page<'a, GrnRecord>,
        summary: String,
        notice: Option<&'a Notice>,
    }

    pub fn print(
        mut out: impl Write,
        page: &Page<'_, GrnRecord>,
        notice: Option<&Notice>,
        fmt: Fmt,
    ) -> io::Result<()> {
        if fmt != Fmt::Tty {
            let view = GrnsView {
                page,
                summary: page.to_string(),
                notice,
            };
            return structured(out, &view, fmt);
        }

        if let Some(n) = notice {
            print_notice(&mut out, n)?;
        }

        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            ["GRN Number", "Invoice Number", "Date"].map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );
        for r in &page.rows {
            table.add_row(vec![
                Cell::new(&r.grn_number).fg(Color::DarkBlue),
                Cell::new(&r.invoice_number),
                Cell::new(r.date),
            ]);
        }

        writeln!(out, "{}", table)?;
        writeln!(out, "{}", page)
    }
}

pub mod bill {
    use super::*;
    use crate::bill::{BillForm, BillTotals, ExpenseLine, PaymentTerms};
    use crate::currency::Currency;
    use crate::line_items::IdGenerator;

    #[derive(Serialize)]
    struct LineView<'a> {
        line: &'a ExpenseLine,
        vat_amount: Decimal,
        total_inclusive: Decimal,
    }

    #[derive(Serialize)]
    struct BillView<'a> {
        supplier: Option<&'a str>,
        bill_number: &'a str,
        bill_date: chrono::NaiveDate,
        due_date: chrono::NaiveDate,
        currency: Currency,
        terms: Option<PaymentTerms>,
        memo: &'a str,
        rate: Decimal,
        lines: Vec<LineView<'a>>,
        totals: BillTotals,
        notice: Option<&'a Notice>,
    }

    /// `account_name` resolves an account id to what is shown in the
    /// account column.
    pub fn print<G: IdGenerator>(
        mut out: impl Write,
        form: &BillForm<G>,
        account_name: impl Fn(&str) -> String,
        notice: Option<&Notice>,
        fmt: Fmt,
    ) -> io::Result<()> {
        let mut lines = Vec::with_capacity(form.lines().len());
        for l in form.lines() {
            lines.push(LineView {
                line: l,
                vat_amount: derived(l.vat_amount())?,
                total_inclusive: derived(l.total_inclusive())?,
            });
        }
        let t = derived(form.totals())?;

        if fmt != Fmt::Tty {
            let view = BillView {
                supplier: form.supplier.as_deref(),
                bill_number: &form.bill_number,
                bill_date: form.bill_date,
                due_date: form.due_date,
                currency: form.currency,
                terms: form.terms,
                memo: &form.memo,
                rate: form.rate().rate,
                lines,
                totals: t,
                notice,
            };
            return structured(out, &view, fmt);
        }

        if let Some(n) = notice {
            print_notice(&mut out, n)?;
        }

        let mut header = Table::new();
        header.load_preset(presets::NOTHING);
        let field = |k: &str, v: String| vec![Cell::new(k).add_attribute(Attribute::Bold), Cell::new(v)];
        header.add_row(field("Supplier / Vendor", form.supplier.clone().unwrap_or_default()));
        header.add_row(field("Bill Number", form.bill_number.clone()));
        header.add_row(field("Bill Date", form.bill_date.to_string()));
        header.add_row(field("Bill Due Date", form.due_date.to_string()));
        header.add_row(field("Currency", form.currency.to_string()));
        header.add_row(field(
            "Payment Terms",
            form.terms.map(|t| t.to_string()).unwrap_or_default(),
        ));
        writeln!(out, "{}\n", header)?;

        let rate = form.rate();
        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            [
                "#".to_string(),
                "Account".to_string(),
                format!("Amount ({})", rate.primary),
                "VAT %".to_string(),
                format!("VAT ({})", rate.primary),
                format!("Total ({})", rate.primary),
                format!("Amount ({})", rate.secondary),
                "Memo".to_string(),
            ]
            .map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );

        for (i, l) in lines.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(l.line.account.as_deref().map(&account_name).unwrap_or_default())
                    .fg(Color::DarkBlue),
                number(l.line.primary()),
                Cell::new(format!("{}%", l.line.vat_percentage)).set_alignment(CellAlignment::Right),
                number(l.vat_amount),
                number(l.total_inclusive),
                number(l.line.secondary()),
                Cell::new(&l.line.memo),
            ]);
        }
        writeln!(out, "{}\n", table)?;

        let mut totals = Table::new();
        totals.load_preset(presets::NOTHING);
        for (k, v) in [
            (format!("Subtotal ({})", rate.primary), t.subtotal),
            (format!("Total VAT ({})", rate.primary), t.vat),
            (format!("Total ({})", rate.secondary), t.secondary),
            (format!("Grand Total ({})", rate.primary), t.grand_total),
        ] {
            totals.add_row(vec![Cell::new(k).add_attribute(Attribute::Bold), number(v)]);
        }
        writeln!(out, "{}", totals)?;
        writeln!(
            out,
            "{}",
            console::style(format!(
                "1 {} = {} {} since {}",
                rate.secondary, rate.rate, rate.primary, rate.effective
            ))
            .dim()
        )
    }
}

pub mod grn {
    use super::*;
    use crate::grn::{GrnForm, GrnHeader, GrnLine, GrnTotals};
    use crate::line_items::IdGenerator;
    use crate::route::Mode;

    #[derive(Serialize)]
    struct LineView<'a> {
        line: &'a GrnLine,
        line_total: Option<Decimal>,
        tax_amount: Option<Decimal>,
        total_inclusive: Option<Decimal>,
    }

    #[derive(Serialize)]
    struct GrnView<'a> {
        title: String,
        mode: Mode,
        header: &'a GrnHeader,
        lines: Vec<LineView<'a>>,
        totals: GrnTotals,
        notice: Option<&'a Notice>,
    }

    pub fn print<G: IdGenerator + Default>(
        mut out: impl Write,
        form: &GrnForm<G>,
        notice: Option<&Notice>,
        fmt: Fmt,
    ) -> io::Result<()> {
        let pct = form.header().tax_percentage;
        let mut lines = Vec::with_capacity(form.lines().len());
        for l in form.lines() {
            lines.push(LineView {
                line: l,
                line_total: derived(l.line_total())?,
                tax_amount: derived(l.tax_amount(pct))?,
                total_inclusive: derived(l.total_inclusive(pct))?,
            });
        }
        let t = derived(form.totals())?;

        if fmt != Fmt::Tty {
            let view = GrnView {
                title: form.title(),
                mode: form.mode(),
                header: form.header(),
                lines,
                totals: t,
                notice,
            };
            return structured(out, &view, fmt);
        }

        if let Some(n) = notice {
            print_notice(&mut out, n)?;
        }
        writeln!(out, "{}\n", console::style(form.title()).bold())?;

        let h = form.header();
        let mut header = Table::new();
        header.load_preset(presets::NOTHING);
        let field = |k: &str, v: String| vec![Cell::new(k).add_attribute(Attribute::Bold), Cell::new(v)];
        header.add_row(field("GRN No", h.grn_no.clone()));
        header.add_row(field("Date", h.date.to_string()));
        header.add_row(field("Invoice No", h.invoice_no.clone()));
        header.add_row(field("Received By Name", h.received_by.clone()));
        header.add_row(field("Purchasing Purpose", h.purchasing_purpose.clone()));
        header.add_row(field("Supplier Name", h.supplier_name.clone()));
        header.add_row(field("Proforma Order No", h.proforma_order_no.clone()));
        header.add_row(field("Company", h.company_name.clone()));
        header.add_row(field(
            "Tax",
            pct.map(|p| format!("{}%", p)).unwrap_or_default(),
        ));
        writeln!(out, "{}\n", header)?;

        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(
            [
                "#", "Model No", "Description", "Unit Price", "Qty", "Amount", "Tax Amount",
                "Amount With", "Reference No", "Remarks",
            ]
            .map(|s| {
                Cell::new(s)
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Center)
            }),
        );

        let opt = |d: Option<Decimal>| d.map(number).unwrap_or_else(|| Cell::new(""));
        for (i, l) in lines.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&l.line.model),
                Cell::new(&l.line.item_description).fg(Color::DarkBlue),
                opt(l.line.unit_price),
                Cell::new(l.line.quantity.map(|q| q.to_string()).unwrap_or_default())
                    .set_alignment(CellAlignment::Right),
                opt(l.line_total),
                opt(l.tax_amount),
                opt(l.total_inclusive),
                Cell::new(&l.line.serial_no),
                Cell::new(&l.line.remarks),
            ]);
        }
        writeln!(out, "{}\n", table)?;

        let mut totals = Table::new();
        totals.load_preset(presets::NOTHING);
        for (k, v) in [("Amount", t.amount), ("Tax", t.tax), ("Total", t.total)] {
            totals.add_row(vec![Cell::new(k).add_attribute(Attribute::Bold), number(v)]);
        }
        finish(out, &totals)
    }
}

/// Derived amounts stay in range while a form is edited through its
/// setters.
fn derived<T>(value: crate::Result<T>) -> io::Result<T> {
    value.map_err(io::Error::other)
}

/// Writes `value` as JSON or as an s-expression.
fn structured<T: Serialize>(mut out: impl Write, value: &T, fmt: Fmt) -> io::Result<()> {
    let text = match fmt {
        Fmt::Lisp => serde_lexpr::to_string(value).map_err(io::Error::other)?,
        _ => serde_json::to_string(value).map_err(io::Error::other)?,
    };
    writeln!(out, "{}", text)
}

/// Writes `table`, treating a closed pipe as success.
fn finish(mut out: impl Write, table: &Table) -> io::Result<()> {
    match writeln!(out, "{}", table) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
    }
}

fn print_notice(mut out: impl Write, notice: &Notice) -> io::Result<()> {
    let text = match notice.variant {
        Variant::Default => console::style(notice.to_string()).green(),
        Variant::Destructive => console::style(notice.to_string()).red(),
    };
    writeln!(out, "{}\n", text.bold())
}

fn chevron(has_children: bool, expanded: bool) -> &'static str {
    match (has_children, expanded) {
        (false, _) => " ",
        (true, true) => "▾",
        (true, false) => "▸",
    }
}

/// Returns a `Cell` displaying "{currency} {value}" of the absolute
/// value, colored DarkRed if `m` is negative.
fn balance(m: Money) -> Cell {
    let cell = Cell::new(m.abs().to_string()).set_alignment(CellAlignment::Right);
    if m.is_negative() {
        cell.fg(Color::DarkRed)
    } else {
        cell
    }
}

fn number(d: Decimal) -> Cell {
    let text = format_decimal(d, 2);
    let cell = if d < Decimal::ZERO {
        Cell::new(console::style(text).red().to_string())
    } else {
        Cell::new(text)
    };
    cell.set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::dec;

    use crate::dataset::mock_grns;
    use crate::filter::Page;
    use crate::grn::{GrnField, GrnForm, HeaderField};
    use crate::notice::Notice;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn grn_list_json_carries_summary_and_notice() {
        let grns = mock_grns();
        let page = Page::first(grns.iter().collect(), 10);
        let notice = Notice::destructive("GRN Deleted", "GRN GRN002 has been deleted successfully.");

        let text = render(|out| grns::print(out, &page, Some(&notice), Fmt::Json));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["summary"], "Showing 1 to 10 of 15 entries");
        assert_eq!(json["page"]["rows"].as_array().unwrap().len(), 10);
        assert_eq!(json["page"]["rows"][0]["grnNumber"], "GRN001");
        assert_eq!(json["notice"]["variant"], "destructive");
    }

    #[test]
    fn grn_form_tty_shows_totals() {
        let mut form = GrnForm::new();
        form.set_line(&"1".into(), GrnField::UnitPrice, "1000").unwrap();
        form.set_line(&"1".into(), GrnField::Quantity, "1").unwrap();
        form.set_header(HeaderField::TaxPercentage, "15").unwrap();

        let text = render(|out| grn::print(out, &form, None, Fmt::Tty));
        assert!(text.contains("New GRN"));
        assert!(text.contains("1,150.00"));
        assert!(text.contains("150.00"));
    }

    #[test]
    fn grn_form_lisp_is_an_sexp() {
        let form = GrnForm::new();
        let text = render(|out| grn::print(out, &form, None, Fmt::Lisp));
        assert!(text.trim_start().starts_with('('));
        assert!(text.contains("New GRN"));
    }

    #[test]
    fn negative_balances_are_shown_unsigned() {
        let cell = balance(Money::new(dec!(-860000), crate::currency::Currency::base()));
        assert_eq!(cell.content(), "LKR 860,000.00");
        assert_eq!(chevron(true, false), "▸");
        assert_eq!(chevron(false, true), " ");
    }
}
