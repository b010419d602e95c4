//! Launcher `.cfg` files and executables.

use crate::{
    error::{ConfigError, Context, Result},
    layout::ApplicationLayout,
    model::{Application, Launcher, StartupEntry},
    pipeline::AppImageBuildEnv,
    platform::OperatingSystem,
    utils::fs,
};
use std::path::Path;

/// Resource name of the launcher executable.
pub const LAUNCHER_RESOURCE: &str = "applauncher";

/// Writes `<name>.cfg` and the executable of every launcher.
pub fn write_launchers(ctx: &AppImageBuildEnv<'_, ApplicationLayout>) -> Result<()> {
    for launcher in ctx.app.launchers() {
        write_launcher(ctx, launcher)
            .with_context(|| format!("writing launcher {}", launcher.name()))?;
    }
    Ok(())
}

fn write_launcher(ctx: &AppImageBuildEnv<'_, ApplicationLayout>, launcher: &Launcher) -> Result<()> {
    let cfg_path = ctx
        .layout
        .app_directory()
        .join(format!("{}.cfg", launcher.name()));
    log::debug!("Writing {}", cfg_path.display());
    fs::write_file(&cfg_path, launcher_config(ctx.app, launcher, ctx.layout)?)?;

    let executable = ctx.layout.launchers_directory().join(launcher.executable_name());
    let resource = ctx
        .env
        .create_resource(LAUNCHER_RESOURCE)
        .with_category("launcher executable");
    let resource = match ctx.app.launcher_template() {
        Some(template) => resource.with_default_path(template),
        None => resource,
    };
    if resource.save_to_file(&executable)? {
        fs::set_executable(&executable)?;
    } else {
        log::warn!(
            "No launcher executable available for {}; only its configuration was written",
            launcher.name()
        );
    }
    Ok(())
}

/// Renders the `.cfg` file of `launcher`.
pub fn launcher_config(
    app: &Application,
    launcher: &Launcher,
    layout: &ApplicationLayout,
) -> Result<String> {
    let info = launcher
        .startup_info()
        .ok_or_else(|| ConfigError::InvalidOption {
            option: format!("launcher.{}", launcher.name()),
            reason: "no startup info".into(),
        })?;

    let mut cfg = String::from("[Application]\n");
    match info.entry() {
        StartupEntry::Module(module) => {
            cfg.push_str(&format!("app.mainmodule={module}/{}\n", info.qualified_class_name()));
            for entry in info.classpath() {
                cfg.push_str(&format!("app.classpath={}\n", app_dir_path(&entry)));
            }
        }
        StartupEntry::ClassPath { .. } => {
            for entry in info.classpath() {
                cfg.push_str(&format!("app.classpath={}\n", app_dir_path(&entry)));
            }
            cfg.push_str(&format!("app.mainclass={}\n", info.qualified_class_name()));
        }
    }
    if let Some(runtime) = app.split_runtime() {
        if let Some(version) = &runtime.version {
            cfg.push_str(&format!("runtime.version={version}\n"));
        }
        if let Some(release) = &runtime.release {
            cfg.push_str(&format!("runtime.release={release}\n"));
        }
        for path in &runtime.search_path {
            cfg.push_str(&format!("runtime.searchpath={path}\n"));
        }
    }

    cfg.push_str("\n[JavaOptions]\n");
    cfg.push_str(&format!("java-options=-Djpackage.app-version={}\n", app.version()));
    for option in info.java_options() {
        cfg.push_str(&format!("java-options={option}\n"));
    }
    if app.mods_dir().is_some() || layout.app_mods_directory().is_dir() {
        let mods = layout
            .app_mods_directory()
            .strip_prefix(layout.app_directory())
            .unwrap_or(Path::new("mods"));
        cfg.push_str("java-options=--module-path\n");
        cfg.push_str(&format!("java-options={}\n", app_dir_path(mods)));
    }

    if !info.default_parameters().is_empty() {
        cfg.push_str("\n[ArgOptions]\n");
        for argument in info.default_parameters() {
            cfg.push_str(&format!("arguments={argument}\n"));
        }
    }
    Ok(cfg)
}

fn app_dir_path(relative: &Path) -> String {
    let separator = match OperatingSystem::current() {
        OperatingSystem::Windows => "\\",
        OperatingSystem::Linux | OperatingSystem::MacOs => "/",
    };
    let mut path = String::from("$APPDIR");
    for component in relative.components() {
        path.push_str(separator);
        path.push_str(&component.as_os_str().to_string_lossy());
    }
    path
}
