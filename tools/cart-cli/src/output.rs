//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use cart_commerce::cart::{Notice, Notifier};
use cart_commerce::CartState;

/// Output handler for CLI messages.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{}", msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            self.json_err(&serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    fn json_err<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            eprintln!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  ").trim_end());
    }

    /// Create a spinner for a pending lookup.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Print the cart contents.
    pub fn cart(&self, cart: &CartState) {
        if self.json {
            self.json(cart);
            return;
        }

        self.header("Cart");
        if cart.is_empty() {
            println!("  {}", style("(empty)").dim());
            return;
        }

        let widths = [6, 40, 10, 6, 10];
        self.table_row(&["ID", "PRODUCT", "PRICE", "QTY", "SUBTOTAL"], &widths);
        for item in cart {
            let id = item.id.to_string();
            let title = truncate(item.title().unwrap_or("-"), widths[1]);
            let price = item.price().map(format_price).unwrap_or_else(|| "-".to_string());
            let amount = item.amount.to_string();
            let subtotal = item
                .price()
                .map(|p| format_price(p * item.amount as f64))
                .unwrap_or_else(|| "-".to_string());
            self.table_row(&[&id, &title, &price, &amount, &subtotal], &widths);
        }

        println!();
        self.kv("products", &cart.len().to_string());
        self.kv("items", &cart.total_amount().to_string());
        if let Some(total) = order_total(cart) {
            self.kv("total", &format_price(total));
        }
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Shows cart notices on the terminal, like a storefront toast.
#[derive(Debug, Clone, Copy)]
pub struct ToastNotifier {
    output: Output,
}

impl ToastNotifier {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::OutOfStock => self.output.warn(notice.message()),
            _ => self.output.error(notice.message()),
        }
    }
}

/// Sum of price times quantity, when every line has a price.
pub fn order_total(cart: &CartState) -> Option<f64> {
    cart.iter()
        .map(|item| item.price().map(|p| p * item.amount as f64))
        .sum()
}

/// Format a price with two decimals.
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
