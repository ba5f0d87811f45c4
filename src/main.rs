use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, info};

use ledgerdesk::{
    Error, Result,
    account::{self, AccountField, AccountType, Summary},
    bill::{BillForm, ExpenseField},
    currency::Currency,
    dataset::Dataset,
    filter::{Filter, PAGE_SIZES, Page},
    grn::{GrnField, GrnForm, GrnRecordField, HeaderField},
    group::Expansion,
    inventory,
    line_items::RowId,
    listing::ListPage,
    misc::today,
    printing,
    rate::{ExchangeRate, RateSource, RateTable},
    repo::InMemory,
    route::{Mode, Route},
    supplier::{self, SupplierField},
    tree::{branch_keys, build_forest, visible_rows},
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ledgerdesk=warn".to_string()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let data = match &cli.data_path {
        Some(path) => Dataset::from_path(path).unwrap_or_else(|e| {
            eprintln!("Error loading data file '{}': {}", path.display(), e);
            std::process::exit(1);
        }),
        None => Dataset::mock(),
    };

    if let Err(err) = run(&cli, &cli.command, data) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, command: &Commands, data: Dataset) -> Result<()> {
    let fmt: printing::Fmt = cli.fmt.clone().into();
    match command {
        Commands::Accounts(args) => accounts(data, args, fmt),
        Commands::Suppliers(args) => suppliers(data, args, cli.per_page, fmt),
        Commands::Inventory(args) => inventory(data, args, fmt),
        Commands::Grns(args) => grns(data, args, cli.per_page, fmt),
        Commands::Grn(args) => grn(data, args, fmt),
        Commands::Bill(args) => bill(data, args, cli.exchange_rate()?, fmt),
        Commands::Open { route } => {
            let route: Route = route.parse()?;
            info!(%route, "opening");
            run(cli, &Commands::from_route(route)?, data)
        }
    }
}

fn accounts(data: Dataset, args: &AccountsArgs, fmt: printing::Fmt) -> Result<()> {
    let currency = args
        .currency
        .as_deref()
        .map(Currency::new)
        .unwrap_or_else(Currency::base);
    let summary = Summary::from_accounts(&data.accounts, currency);

    let mut filter = Filter::new();
    if let Some(q) = &args.search {
        filter.set_quick(q);
    }
    if let Some(n) = &args.number {
        filter.set_field(AccountField::Number, n);
    }
    let shown = filter.apply(&data.accounts);
    let groups = account::group_by_type(shown.iter().copied());

    let mut expansion = account::default_expansion();
    if args.collapse_all {
        expansion.collapse_all();
    }
    if args.expand_all {
        expansion.expand_all(groups.iter().map(|g| *g.key()));
    }
    for kind in &args.toggle {
        expansion.toggle(*kind);
    }

    if args.tree {
        let forest = build_forest(&data.accounts)?;
        let mut open = Expansion::new();
        if !args.collapse_all {
            open.expand_all(branch_keys(&forest));
        }
        let rows = visible_rows(&forest, &open);
        printing::accounts::print(
            io::stdout(),
            &summary,
            &groups,
            &expansion,
            Some(rows.as_slice()),
            fmt,
        )?;
    } else {
        printing::accounts::print(io::stdout(), &summary, &groups, &expansion, None, fmt)?;
    }
    Ok(())
}

fn suppliers(
    data: Dataset,
    args: &SuppliersArgs,
    per_page: usize,
    fmt: printing::Fmt,
) -> Result<()> {
    let mut filter = Filter::new();
    if let Some(q) = &args.search {
        filter.set_quick(q);
    }
    if let Some(n) = &args.name {
        filter.set_field(SupplierField::Name, n);
    }
    if let Some(e) = &args.email {
        filter.set_field(SupplierField::Email, e);
    }

    let payable = supplier::payable_by_currency(&data.suppliers)
        .iter()
        .map(|g| g.total())
        .collect::<Result<Vec<_>>>()?;
    let page = Page::first(filter.apply(&data.suppliers), per_page);

    printing::suppliers::print(io::stdout(), &page, data.suppliers.len(), &payable, fmt)?;
    Ok(())
}

fn inventory(data: Dataset, args: &InventoryArgs, fmt: printing::Fmt) -> Result<()> {
    let mut expansion = inventory::default_expansion();
    if args.expand_all {
        expansion.expand_all(branch_keys(&data.inventory));
    }
    for id in &args.toggle {
        if inventory::find(&data.inventory, id).is_none() {
            return Err(Error::UnknownRecord(id.clone()));
        }
        expansion.toggle(id.clone());
    }

    let rows = visible_rows(&data.inventory, &expansion);
    printing::inventory::print(io::stdout(), &rows, fmt)?;
    Ok(())
}

fn grns(data: Dataset, args: &GrnsArgs, per_page: usize, fmt: printing::Fmt) -> Result<()> {
    let mut list = ListPage::new(InMemory::from_records(data.grns)?);
    list.set_per_page(per_page)?;

    if let Some(q) = &args.search {
        list.filter.set_quick(q);
    }
    if let Some(g) = &args.grn {
        list.filter.set_field(GrnRecordField::GrnNumber, g);
    }
    if let Some(i) = &args.invoice {
        list.filter.set_field(GrnRecordField::InvoiceNumber, i);
    }
    if let Some(d) = &args.from {
        list.filter.set_date_from(d)?;
    }
    if let Some(d) = &args.to {
        list.filter.set_date_to(d)?;
    }

    let notice = match &args.delete {
        Some(id) => {
            let label = list.request_delete(id)?.grn_number.clone();
            if args.yes {
                list.confirm_delete()?
            } else {
                eprintln!("Delete GRN {label}? Run again with --yes to confirm.");
                list.cancel_delete();
                None
            }
        }
        None => None,
    };

    printing::grns::print(io::stdout(), &list.page(), notice.as_ref(), fmt)?;
    Ok(())
}

fn grn(data: Dataset, args: &GrnArgs, fmt: printing::Fmt) -> Result<()> {
    let route = Route::new("/grn", args.id.clone(), args.mode.unwrap_or_default())?;

    let mut form = match (&route.id, route.mode) {
        (Some(id), Mode::View | Mode::Edit) => {
            let record = data
                .grns
                .iter()
                .find(|g| &g.id == id)
                .ok_or_else(|| Error::UnknownRecord(id.clone()))?;
            GrnForm::open(record, route.mode)
        }
        _ => GrnForm::new(),
    };

    if args.clear {
        form.clear()?;
    }
    for a in &args.set {
        form.set_header(a.field.parse::<HeaderField>()?, &a.value)?;
    }
    for a in &args.lines {
        while form.lines().len() < a.row {
            form.add_line()?;
        }
        let id = row_id(form.lines().iter().map(|l| &l.id), a.row)?;
        form.set_line(&id, a.field.parse::<GrnField>()?, &a.value)?;
    }
    for row in descending(&args.remove) {
        let id = row_id(form.lines().iter().map(|l| &l.id), row)?;
        form.remove_line(&id)?;
    }

    let notice = if args.save {
        let (record, notice) = form.save()?;
        let taken = data
            .grns
            .iter()
            .any(|g| g.id != record.id && g.grn_number == record.grn_number);
        if taken && !record.grn_number.is_empty() {
            return Err(Error::DuplicateId(record.grn_number));
        }
        debug!(id = %record.id, grn = %record.grn_number, "grn saved");
        Some(notice)
    } else {
        None
    };

    printing::grn::print(io::stdout(), &form, notice.as_ref(), fmt)?;
    Ok(())
}

fn bill(data: Dataset, args: &BillArgs, rate: ExchangeRate, fmt: printing::Fmt) -> Result<()> {
    let mut form = BillForm::new(rate);

    if let Some(s) = &args.supplier {
        if !data.suppliers.iter().any(|x| &x.id == s) {
            return Err(Error::UnknownRecord(s.clone()));
        }
        form.set_supplier(s);
    }
    if let Some(n) = &args.bill_number {
        form.bill_number = n.trim().to_string();
    }
    if let Some(c) = &args.currency {
        form.set_currency(c)?;
    }
    if let Some(d) = &args.bill_date {
        form.set_bill_date(d)?;
    }
    if let Some(t) = &args.terms {
        form.set_terms(t)?;
    }
    if let Some(d) = &args.due_date {
        form.set_due_date(d)?;
    }
    if let Some(m) = &args.memo {
        form.memo = m.clone();
    }

    for a in &args.lines {
        while form.lines().len() < a.row {
            form.add_line();
        }
        let field = a.field.parse::<ExpenseField>()?;
        if field == ExpenseField::Account
            && !a.value.trim().is_empty()
            && !account::bill_accounts(&data.accounts).any(|x| x.id == a.value.trim())
        {
            return Err(Error::UnknownRecord(a.value.trim().to_string()));
        }
        let id = row_id(form.lines().iter().map(|l| &l.id), a.row)?;
        form.set_line(&id, field, &a.value)?;
    }
    for row in descending(&args.remove) {
        let id = row_id(form.lines().iter().map(|l| &l.id), row)?;
        form.remove_line(&id)?;
    }

    let notice = if args.save {
        let (bill, notice) = form.save()?;
        debug!(total = %bill.total_amount, "bill captured");
        Some(notice)
    } else {
        None
    };

    let account_name = |id: &str| {
        data.accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    printing::bill::print(io::stdout(), &form, account_name, notice.as_ref(), fmt)?;
    Ok(())
}

/// Id of the line shown at 1-based position `row`.
fn row_id<'a>(mut ids: impl Iterator<Item = &'a RowId>, row: usize) -> Result<RowId> {
    row.checked_sub(1)
        .and_then(|i| ids.nth(i))
        .cloned()
        .ok_or_else(|| Error::UnknownRow(row.to_string()))
}

/// Positions from last to first, so removing one does not shift the rest.
fn descending(rows: &[usize]) -> Vec<usize> {
    let mut rows = rows.to_vec();
    rows.sort_unstable_by(|a, b| b.cmp(a));
    rows.dedup();
    rows
}

/// Output format of the screens
#[derive(clap::ValueEnum, Clone, Debug)]
enum Fmt {
    Tty,
    Json,
    Lisp,
}

impl From<Fmt> for printing::Fmt {
    fn from(arg: Fmt) -> Self {
        match arg {
            Fmt::Json => printing::Fmt::Json,
            Fmt::Tty => printing::Fmt::Tty,
            Fmt::Lisp => printing::Fmt::Lisp,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    about,
    long_about = None)] // Read from `Cargo.toml`
struct Cli {
    /// JSON file with accounts, suppliers, grns and inventory. The
    /// built-in demo records are used when absent.
    #[arg(short = 'd', long = "data", global = true)]
    data_path: Option<PathBuf>,

    /// LKR per USD used by the bill screen.
    #[arg(long = "rate", global = true)]
    rate: Option<Decimal>,

    /// Day the exchange rate is looked up for.
    #[arg(long = "rate-date", global = true, default_value_t = today())]
    rate_date: NaiveDate,

    /// Rows per page on list screens.
    #[arg(long = "per-page", global = true, default_value_t = PAGE_SIZES[0], value_parser = page_size)]
    per_page: usize,

    /// Format of the screen to generate.
    #[arg(long = "fmt", global = true, default_value_t = Fmt::Tty, value_enum)]
    fmt: Fmt,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn exchange_rate(&self) -> Result<ExchangeRate> {
        let (lkr, usd) = (Currency::base(), Currency::new("USD"));
        let mut rates = RateTable::with_default_rate();
        if let Some(rate) = self.rate {
            rates.upsert(ExchangeRate::new(lkr, usd, rate, self.rate_date)?);
        }
        rates.require_rate(lkr, usd, self.rate_date)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Chart of accounts grouped by type.
    #[command(alias = "coa")]
    Accounts(AccountsArgs),

    /// Supplier list with payables per currency.
    Suppliers(SuppliersArgs),

    /// Stock table with expandable rows.
    #[command(alias = "table")]
    Inventory(InventoryArgs),

    /// Goods received notes list.
    Grns(GrnsArgs),

    /// Goods received note entry.
    Grn(GrnArgs),

    /// Bill entry.
    Bill(BillArgs),

    /// Open a screen by route, e.g. `/grn?id=3&mode=view`.
    Open { route: String },
}

impl Commands {
    fn from_route(route: Route) -> Result<Commands> {
        let command = match route.path.as_str() {
            "/grn" => Commands::Grn(GrnArgs {
                id: route.id,
                mode: Some(route.mode),
                ..GrnArgs::default()
            }),
            "/grn-list" => Commands::Grns(GrnsArgs::default()),
            "/accounts" => Commands::Accounts(AccountsArgs::default()),
            "/suppliers" => Commands::Suppliers(SuppliersArgs::default()),
            "/table" => Commands::Inventory(InventoryArgs::default()),
            "/bills/new" => Commands::Bill(BillArgs::default()),
            _ => return Err(Error::InvalidRoute(route.to_string())),
        };
        Ok(command)
    }
}

#[derive(Args, Default)]
struct AccountsArgs {
    /// Show accounts along their parent links instead of by type. Every
    /// branch starts open unless --collapse-all is given.
    #[arg(long, conflicts_with_all = ["search", "number", "toggle"])]
    tree: bool,

    /// Open or close the group of this account type. Repeatable.
    #[arg(long = "toggle", value_name = "TYPE")]
    toggle: Vec<AccountType>,

    #[arg(long)]
    expand_all: bool,

    #[arg(long)]
    collapse_all: bool,

    /// Quick search on account name and number.
    #[arg(short, long)]
    search: Option<String>,

    /// Only accounts whose number contains this text.
    #[arg(long)]
    number: Option<String>,

    /// Currency of the summary cards.
    #[arg(long)]
    currency: Option<String>,
}

#[derive(Args, Default)]
struct SuppliersArgs {
    /// Quick search on name and email.
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,
}

#[derive(Args, Default)]
struct InventoryArgs {
    /// Open or close the row with this id. Repeatable.
    #[arg(long = "toggle", value_name = "ID")]
    toggle: Vec<String>,

    #[arg(long)]
    expand_all: bool,
}

#[derive(Args, Default)]
struct GrnsArgs {
    /// Quick search on GRN and invoice number.
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long)]
    grn: Option<String>,

    #[arg(long)]
    invoice: Option<String>,

    /// Only GRNs dated on or after this day.
    #[arg(long)]
    from: Option<String>,

    /// Only GRNs dated on or before this day.
    #[arg(long)]
    to: Option<String>,

    /// Delete the GRN with this id.
    #[arg(long, value_name = "ID")]
    delete: Option<String>,

    /// Confirm --delete.
    #[arg(short, long, requires = "delete")]
    yes: bool,
}

#[derive(Args, Default)]
struct GrnArgs {
    /// GRN to open. Needed with `--mode view` and `--mode edit`.
    #[arg(long)]
    id: Option<String>,

    #[arg(long)]
    mode: Option<Mode>,

    /// Header field, e.g. `--set invoice=INV-9`. Repeatable.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<Assign>,

    /// Line field, e.g. `--line 2:qty=4`. Lines are added as needed.
    #[arg(long = "line", value_name = "ROW:FIELD=VALUE")]
    lines: Vec<LineAssign>,

    /// Remove the line at this position. Repeatable.
    #[arg(long = "remove", value_name = "ROW")]
    remove: Vec<usize>,

    /// Start over before applying the edits.
    #[arg(long)]
    clear: bool,

    #[arg(long)]
    save: bool,
}

#[derive(Args, Default)]
struct BillArgs {
    /// Supplier id.
    #[arg(long)]
    supplier: Option<String>,

    #[arg(long = "number")]
    bill_number: Option<String>,

    #[arg(long = "date")]
    bill_date: Option<String>,

    #[arg(long = "due")]
    due_date: Option<String>,

    /// One of net15, net30, net45, net60, due-on-receipt.
    #[arg(long)]
    terms: Option<String>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    memo: Option<String>,

    /// Expense line field, e.g. `--line 1:amount=1000`. Lines are added
    /// as needed.
    #[arg(long = "line", value_name = "ROW:FIELD=VALUE")]
    lines: Vec<LineAssign>,

    #[arg(long = "remove", value_name = "ROW")]
    remove: Vec<usize>,

    #[arg(long)]
    save: bool,
}

#[derive(Clone, Debug)]
struct Assign {
    field: String,
    value: String,
}

impl FromStr for Assign {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
        Ok(Assign {
            field: field.trim().to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Clone, Debug)]
struct LineAssign {
    row: usize,
    field: String,
    value: String,
}

impl FromStr for LineAssign {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (row, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("expected ROW:FIELD=VALUE, got '{s}'"))?;
        let row = row
            .trim()
            .parse()
            .map_err(|e| format!("bad row '{row}': {e}"))?;
        let Assign { field, value } = rest.parse()?;
        Ok(LineAssign { row, field, value })
    }
}

fn page_size(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if PAGE_SIZES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("expected one of {:?}", PAGE_SIZES))
    }
}
