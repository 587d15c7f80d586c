use std::io::{stdin, stdout};

fn main() {
    let stdin = stdin();
    let stdout = stdout();
    core_chess::uci::run(stdin.lock(), stdout.lock());
}
