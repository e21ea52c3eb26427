//! `spoolctl config`: Configuration management commands.

use spoolctl_config::AppConfig;
use std::path::Path;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!(
                "   API base:  {}",
                config.api_base.as_deref().unwrap_or("(not set)")
            );
            println!("   Printers:  {}", config.printers.len());
            for (printer, slots) in &config.printers {
                println!("      {printer}: {}", slots.join(", "));
            }
            println!("   Aliases:   {}", config.location_aliases.len());
        }
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    }

    Ok(())
}

/// Settings that parse but will get in the way at run time.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.api_base.is_none() {
        warnings.push("No api_base set (set it in config.toml or SPOOLCTL_API_BASE)".to_string());
    }
    if config.printers.is_empty() {
        warnings.push("No printers configured; `plan next` needs at least one".to_string());
    }
    for (printer, slots) in &config.printers {
        if slots.is_empty() {
            warnings.push(format!("Printer '{printer}' has no slots"));
        }
    }
    for (alias, location) in &config.location_aliases {
        if alias.contains(':') || location.trim().is_empty() {
            warnings.push(format!("Alias '{alias}' cannot be resolved"));
        } else if *alias != alias.to_uppercase() {
            warnings.push(format!(
                "Alias '{alias}' is not upper case and will never match; use '{}'",
                alias.to_uppercase()
            ));
        }
    }
    if let Some(dir) = &config.plans_dir {
        if !dir.is_dir() {
            warnings.push(format!("plans_dir {} does not exist", dir.display()));
        }
    }

    warnings
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_file(config_path);
    println!("{}", path.display());
    if !path.exists() {
        println!();
        println!("# No file yet. A starting point:");
        println!("{}", AppConfig::default_toml());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = super::super::config_file(None);
        assert!(path.to_str().unwrap().contains("config.toml"));
        assert_eq!(
            super::super::config_file(Some(Path::new("/tmp/x.toml"))),
            Path::new("/tmp/x.toml")
        );
    }

    #[test]
    fn empty_config_warns_about_missing_pieces() {
        let w = warnings(&AppConfig::default());
        assert!(w.iter().any(|w| w.contains("api_base")));
        assert!(w.iter().any(|w| w.contains("printers")));
    }

    #[test]
    fn lowercase_alias_key_is_flagged() {
        let mut config = AppConfig::default();
        config.location_aliases.insert("dry".into(), "Dry Box".into());
        config.location_aliases.insert("A".into(), "AMS A".into());
        let w = warnings(&config);
        assert!(w.iter().any(|w| w.contains("'dry'") && w.contains("'DRY'")));
        assert!(!w.iter().any(|w| w.contains("'A'")));
    }

    #[test]
    fn starter_config_has_no_slot_warnings() {
        let config: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert!(!warnings(&config).iter().any(|w| w.contains("no slots")));
    }
}
