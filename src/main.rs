pub mod cast;
pub mod check;
pub mod cli;
pub mod create;
pub mod errors;
pub mod path_de;
pub mod pattern;
pub mod schema;
pub mod scope;
pub mod value;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
