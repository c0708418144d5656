//! lb-report - Print balances, trees, monthly series and open items.

fn main() -> std::process::ExitCode {
    ledgerbook::cmd::report_cmd::main()
}
