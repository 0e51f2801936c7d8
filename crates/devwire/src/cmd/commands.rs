use crate::cmd::{load_registry, CommandsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_commands, OutputFormat};

pub fn run(args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(Some(args.dir.as_path()))?;
    let types: Vec<_> = registry
        .intents()
        .into_iter()
        .filter_map(|intent| registry.get(intent))
        .collect();
    print_commands(&types, format);
    Ok(SUCCESS)
}
