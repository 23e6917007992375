use pwpatch_cli::Target;
use std::process::ExitCode;

fn main() -> ExitCode {
    pwpatch_cli::main_for(Target::CircleCi)
}
