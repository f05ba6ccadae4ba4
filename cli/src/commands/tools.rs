use colored::*;

use submergex_common::config::{CommandRegistry, Config, RECOMMENDED_TOOLS};
use submergex_core::tools;

use crate::mprint;
use crate::terminal::{colors, print};

/// Lists producers (numbered as `--tools` accepts them) and probers with their install state.
pub async fn tools(registry: &CommandRegistry, cfg: &Config) -> anyhow::Result<()> {
    print::header("enumeration tools", cfg.quiet);
    for (idx, name) in registry.producer_names().into_iter().enumerate() {
        let template: String = registry.producer(name)?.template;
        let mut title: String = name.to_string();
        if RECOMMENDED_TOOLS.contains(&name) {
            title.push_str(" (recommended)");
        }

        print::tree_head(idx + 1, &title);
        print::as_tree_one_level(vec![
            (String::from("Command"), template.normal()),
            (String::from("Status"), install_state(&template).await),
        ]);
    }

    mprint!();
    print::header("probers", cfg.quiet);
    for (idx, name) in registry.prober_names().into_iter().enumerate() {
        let command: &str = registry.prober(name)?;

        print::tree_head(idx + 1, name);
        print::as_tree_one_level(vec![
            (String::from("Command"), command.normal()),
            (String::from("Status"), install_state(command).await),
        ]);
    }
    print::tree_head(registry.prober_names().len() + 1, "builtin");
    print::as_tree_one_level(vec![(String::from("Status"), "always available".green())]);

    Ok(())
}

async fn install_state(command: &str) -> ColoredString {
    let Some(binary) = tools::binary_of(command) else {
        return "empty command".color(colors::DEAD);
    };
    match tools::is_installed(binary).await {
        true => "installed".green(),
        false => format!("{binary} not found").color(colors::DEAD),
    }
}
