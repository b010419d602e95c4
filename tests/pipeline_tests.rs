use app_packager::{
    app_image_file::{AppImageFile, CreatorInfo},
    env::{BuildEnv, BuildEnvBuilder},
    error::{AppImageFileError, ConfigError, Error, InternalError, PackagingError},
    image::PACKAGE_FILE,
    layout::ApplicationLayout,
    model::{Application, ApplicationBuilder, Launcher, LauncherStartupInfo, Package, PackageBuilder},
    pipeline::{PackagingPipeline, PipelineBuilder, PipelineMode, TaskAction, TaskGroup, TaskId},
    platform::{OperatingSystem, PackageType},
    runtime::CopyRuntimeBuilder,
};
use std::{
    collections::BTreeSet,
    fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

const SHARED: TaskId = TaskId::Custom("shared");

fn package_type() -> PackageType {
    PackageType::all_for_current_platform()[0]
}

fn foo_launcher() -> Launcher {
    Launcher::new("Foo").with_startup_info(LauncherStartupInfo::module("m", "m.Main"))
}

fn app(with_runtime: Option<&Path>) -> Arc<Application> {
    let mut builder = ApplicationBuilder::new()
        .name("Foo")
        .version("1.0")
        .launcher(foo_launcher());
    if let Some(source) = with_runtime {
        builder = builder.runtime_builder(Arc::new(CopyRuntimeBuilder::new(source)));
    }
    Arc::new(builder.build().unwrap())
}

fn env_for(root: &Path, app: &Application) -> BuildEnv {
    BuildEnvBuilder::new(root.join("build"))
        .app_image_dir_for(app)
        .create()
        .unwrap()
}

/// Writes a minimal predefined app image for `pkg` at `dir`.
fn predefined_image(pkg: &Package, dir: &Path, creator: CreatorInfo) {
    let layout = ApplicationLayout::from_layout(pkg.app_layout_at(dir).unwrap()).unwrap();
    fs::create_dir_all(layout.app_directory()).unwrap();
    fs::create_dir_all(layout.runtime_directory()).unwrap();
    fs::write(layout.app_directory().join("Foo.cfg"), "[Application]\n").unwrap();
    AppImageFile::from_application(pkg.app())
        .unwrap()
        .with_creator(creator)
        .save(&layout)
        .unwrap();
}

/// Standard pipeline with every action replaced by one recording its task.
fn recording_pipeline() -> (PackagingPipeline, Arc<Mutex<Vec<TaskId>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = PipelineBuilder::standard();
    for id in [
        TaskId::Runtime,
        TaskId::Launchers,
        TaskId::Content,
        TaskId::AppImageFile,
        TaskId::Copy,
        TaskId::WritePackageFile,
        TaskId::RunPostImageUserScript,
        SHARED,
    ] {
        let log = Arc::clone(&log);
        builder
            .task(id)
            .action(TaskAction::no_arg(move || {
                log.lock().unwrap().push(id);
                Ok(())
            }))
            .add();
    }
    builder
        .task(SHARED)
        .in_group(TaskGroup::ApplicationImage)
        .in_group(TaskGroup::CopyAppImage)
        .add();
    (builder.create().unwrap(), log)
}

fn ran(log: &Mutex<Vec<TaskId>>) -> BTreeSet<TaskId> {
    log.lock().unwrap().iter().copied().collect()
}

fn image_tasks() -> BTreeSet<TaskId> {
    BTreeSet::from([
        TaskId::Runtime,
        TaskId::Launchers,
        TaskId::Content,
        TaskId::AppImageFile,
        SHARED,
    ])
}

#[tokio::test]
async fn test_image_only_with_runtime_builder() {
    let tmp = TempDir::new().unwrap();
    let app = app(Some(tmp.path()));
    let env = env_for(tmp.path(), &app);
    let (pipeline, log) = recording_pipeline();

    pipeline.execute_app_image(&env, app).await.unwrap();
    assert_eq!(ran(&log), image_tasks());
}

#[tokio::test]
async fn test_image_only_without_runtime_builder() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let (pipeline, log) = recording_pipeline();

    pipeline.execute_app_image(&env, app).await.unwrap();
    assert_eq!(ran(&log), image_tasks());
}

#[tokio::test]
async fn test_package_with_fresh_image() {
    let tmp = TempDir::new().unwrap();
    let app = app(Some(tmp.path()));
    let env = env_for(tmp.path(), &app);
    let pkg = Arc::new(PackageBuilder::new(app).package_type(package_type()).build().unwrap());
    let (pipeline, log) = recording_pipeline();

    let params = pipeline
        .create_startup_parameters(&env, pkg, tmp.path().join("out"))
        .unwrap();
    assert_eq!(params.mode(), PipelineMode::PackageWithFreshImage);
    pipeline.execute(params).await.unwrap();

    assert_eq!(
        ran(&log),
        BTreeSet::from([
            TaskId::Runtime,
            TaskId::Launchers,
            TaskId::Content,
            SHARED,
            TaskId::WritePackageFile,
            TaskId::RunPostImageUserScript,
        ])
    );
}

#[tokio::test]
async fn test_package_from_existing_image() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let image_dir = tmp.path().join("predefined");
    let pkg = PackageBuilder::new(app)
        .package_type(package_type())
        .predefined_app_image(&image_dir)
        .build()
        .unwrap();
    predefined_image(&pkg, &image_dir, CreatorInfo::current());
    let (pipeline, log) = recording_pipeline();

    let params = pipeline
        .create_startup_parameters(&env, Arc::new(pkg), tmp.path().join("out"))
        .unwrap();
    assert_eq!(params.mode(), PipelineMode::PackageFromExistingImage);
    assert!(params.env().app_image_dir().starts_with(env.build_root().join("image")));
    pipeline.execute(params).await.unwrap();

    assert_eq!(
        ran(&log),
        BTreeSet::from([
            TaskId::Copy,
            SHARED,
            TaskId::WritePackageFile,
            TaskId::RunPostImageUserScript,
        ])
    );
}

#[test]
fn test_existing_image_without_copy_action_is_packaged_in_place() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let image_dir = tmp.path().join("predefined");
    let pkg = PackageBuilder::new(app)
        .package_type(package_type())
        .predefined_app_image(&image_dir)
        .build()
        .unwrap();
    predefined_image(&pkg, &image_dir, CreatorInfo::current());

    let mut builder = PipelineBuilder::standard();
    builder.task(TaskId::Copy).no_action().add();
    let pipeline = builder.create().unwrap();

    let params = pipeline
        .create_startup_parameters(&env, Arc::new(pkg), tmp.path().join("out"))
        .unwrap();
    assert_eq!(params.env().app_image_dir(), image_dir);
}

#[tokio::test]
async fn test_single_launcher_image() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);

    PackagingPipeline::standard()
        .unwrap()
        .execute_app_image(&env, app)
        .await
        .unwrap();

    let layout = ApplicationLayout::platform_app_image()
        .resolve_at(env.app_image_dir())
        .unwrap();
    let cfg = fs::read_to_string(layout.app_directory().join("Foo.cfg")).unwrap();
    assert!(cfg.contains("app.mainmodule=m/m.Main"));

    let xml = fs::read_to_string(layout.app_directory().join(AppImageFile::FILE_NAME)).unwrap();
    assert!(xml.contains(r#"<main-launcher name="Foo">"#));
    let loaded = AppImageFile::load(&layout).unwrap();
    assert_eq!(loaded.main_launcher().name(), "Foo");
    assert_eq!(loaded.app_version(), "1.0");

    // Packaging tasks never run for an image-only build
    assert!(!layout.app_directory().join(PACKAGE_FILE).exists());
}

#[tokio::test]
async fn test_fresh_package_copies_runtime() {
    let tmp = TempDir::new().unwrap();
    let jdk = tmp.path().join("jdk");
    fs::create_dir_all(jdk.join("bin")).unwrap();
    fs::write(jdk.join("bin/java"), "#!/bin/sh\n").unwrap();

    let app = app(Some(&jdk));
    let env = env_for(tmp.path(), &app);
    let pkg = Arc::new(PackageBuilder::new(app).package_type(package_type()).build().unwrap());

    PackagingPipeline::standard()
        .unwrap()
        .execute_package(&env, pkg.clone(), tmp.path().join("out"))
        .await
        .unwrap();

    let layout =
        ApplicationLayout::from_layout(pkg.package_layout_at(env.app_image_dir()).unwrap()).unwrap();
    assert!(layout.runtime_directory().join("bin/java").is_file());
    assert_eq!(
        fs::read_to_string(layout.app_directory().join(PACKAGE_FILE)).unwrap(),
        "Foo"
    );
    // The app image file is only written for image-only builds
    assert!(!layout.app_directory().join(AppImageFile::FILE_NAME).exists());
}

#[tokio::test]
async fn test_copy_excludes_app_image_file() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let image_dir = tmp.path().join("predefined");
    let pkg = Arc::new(
        PackageBuilder::new(app)
            .package_type(package_type())
            .predefined_app_image(&image_dir)
            .build()
            .unwrap(),
    );
    predefined_image(&pkg, &image_dir, CreatorInfo::current());

    let pipeline = PackagingPipeline::standard().unwrap();
    let params = pipeline
        .create_startup_parameters(&env, pkg, tmp.path().join("out"))
        .unwrap();
    let staged = ApplicationLayout::from_layout(params.env().app_image_layout().clone()).unwrap();
    pipeline.execute(params).await.unwrap();

    assert!(staged.app_directory().join("Foo.cfg").is_file());
    assert!(staged.app_directory().join(PACKAGE_FILE).is_file());
    assert!(!staged.app_directory().join(AppImageFile::FILE_NAME).exists());
}

#[test]
fn test_foreign_version_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let image_dir = tmp.path().join("predefined");
    let pkg = PackageBuilder::new(app)
        .package_type(package_type())
        .predefined_app_image(&image_dir)
        .build()
        .unwrap();
    predefined_image(
        &pkg,
        &image_dir,
        CreatorInfo::new(OperatingSystem::current(), "0.0.0-foreign"),
    );

    let err = PackagingPipeline::standard()
        .unwrap()
        .create_startup_parameters(&env, Arc::new(pkg), tmp.path().join("out"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::AppImageFile(AppImageFileError::ForeignImage { .. }))
    ));
}

#[test]
fn test_missing_predefined_image_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let pkg = PackageBuilder::new(app)
        .package_type(package_type())
        .predefined_app_image(tmp.path().join("missing"))
        .build()
        .unwrap();

    let err = PackagingPipeline::standard()
        .unwrap()
        .create_startup_parameters(&env, Arc::new(pkg), tmp.path().join("out"))
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_cycle_rejected() {
    let mut builder = PipelineBuilder::standard();
    builder.link(TaskId::Package, TaskId::Runtime);
    assert!(matches!(
        builder.create(),
        Err(Error::Internal(InternalError::CycleDetected { .. }))
    ));
}

#[tokio::test]
async fn test_failure_stops_dependents() {
    let tmp = TempDir::new().unwrap();
    let app = app(None);
    let env = env_for(tmp.path(), &app);
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut builder = PipelineBuilder::standard();
    builder
        .task(TaskId::Content)
        .action(TaskAction::no_arg(|| {
            Err(PackagingError::Generic("content unavailable".into()).into())
        }))
        .add();
    let dependent_log = Arc::clone(&log);
    builder
        .task(TaskId::AppImageFile)
        .action(TaskAction::no_arg(move || {
            dependent_log.lock().unwrap().push(TaskId::AppImageFile);
            Ok(())
        }))
        .add();

    let err = builder
        .create()
        .unwrap()
        .execute_app_image(&env, app)
        .await
        .unwrap_err();
    match err {
        Error::Packaging(PackagingError::TaskFailed { task, .. }) => assert_eq!(task, "content"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(log.lock().unwrap().is_empty());
}

fn runtime_tree(dir: &Path) {
    fs::create_dir_all(dir.join("bin")).unwrap();
    fs::write(dir.join("bin/java"), "#!/bin/sh\n").unwrap();
    fs::write(dir.join("release"), "JAVA_VERSION=\"21\"\n").unwrap();
}

fn files_named(root: &Path, name: &str) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() == name)
        .count()
}

#[cfg(unix)]
#[tokio::test]
async fn test_launcher_executable_from_resource() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let template = tmp.path().join("launcher-template");
    fs::write(&template, "template launcher").unwrap();
    let resources = tmp.path().join("resources");
    fs::create_dir_all(&resources).unwrap();

    let app = Arc::new(
        ApplicationBuilder::new()
            .name("Foo")
            .launcher(foo_launcher())
            .launcher_template(&template)
            .build()
            .unwrap(),
    );
    let pipeline = PackagingPipeline::standard().unwrap();

    // Without an override the template is installed
    let env = env_for(&tmp.path().join("default"), &app);
    pipeline.execute_app_image(&env, app.clone()).await.unwrap();
    let layout = ApplicationLayout::platform_app_image()
        .resolve_at(env.app_image_dir())
        .unwrap();
    let executable = layout
        .launchers_directory()
        .join(app.main_launcher().unwrap().executable_name());
    assert_eq!(fs::read_to_string(&executable).unwrap(), "template launcher");
    let mode = fs::metadata(&executable).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    // A resource directory override wins
    fs::write(resources.join("applauncher"), "custom launcher").unwrap();
    let env = BuildEnvBuilder::new(tmp.path().join("custom/build"))
        .resource_dir(&resources)
        .app_image_dir_for(&app)
        .create()
        .unwrap();
    pipeline.execute_app_image(&env, app.clone()).await.unwrap();
    let layout = ApplicationLayout::platform_app_image()
        .resolve_at(env.app_image_dir())
        .unwrap();
    let executable = layout
        .launchers_directory()
        .join(app.main_launcher().unwrap().executable_name());
    assert_eq!(fs::read_to_string(&executable).unwrap(), "custom launcher");
    let mode = fs::metadata(&executable).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[tokio::test]
async fn test_launcher_failure_names_launcher() {
    let tmp = TempDir::new().unwrap();
    let app = Arc::new(
        ApplicationBuilder::new()
            .name("Foo")
            .launcher(foo_launcher())
            .launcher(Launcher::new("Bar"))
            .build()
            .unwrap(),
    );
    let env = env_for(tmp.path(), &app);

    let err = PackagingPipeline::standard()
        .unwrap()
        .execute_app_image(&env, app)
        .await
        .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("writing launcher Bar"), "{err}");
}

/// Fresh package with `script` installed as the post-image script.
#[cfg(unix)]
async fn run_with_post_image_script(tmp: &TempDir, script: &str) -> (Result<(), Error>, std::path::PathBuf) {
    let jdk = tmp.path().join("jdk");
    runtime_tree(&jdk);
    let resources = tmp.path().join("resources");
    fs::create_dir_all(&resources).unwrap();
    fs::write(resources.join("Foo-post-image.sh"), script).unwrap();

    let app = app(Some(&jdk));
    let env = BuildEnvBuilder::new(tmp.path().join("build"))
        .resource_dir(&resources)
        .app_image_dir_for(&app)
        .create()
        .unwrap();
    let pkg = Arc::new(PackageBuilder::new(app).package_type(package_type()).build().unwrap());

    let pipeline = PackagingPipeline::standard().unwrap();
    let params = pipeline
        .create_startup_parameters(&env, pkg, tmp.path().join("out"))
        .unwrap();
    let image_dir = params.env().app_image_dir().to_path_buf();
    (pipeline.execute(params).await, image_dir)
}

#[cfg(unix)]
#[tokio::test]
async fn test_post_image_script_runs_in_image() {
    let tmp = TempDir::new().unwrap();
    let script = "echo \"$JpAppImageDir\" > image-dir.txt\npwd -P > cwd.txt\n";
    let (result, image_dir) = run_with_post_image_script(&tmp, script).await;
    result.unwrap();

    let recorded = fs::read_to_string(image_dir.join("image-dir.txt")).unwrap();
    assert_eq!(recorded.trim_end(), image_dir.to_str().unwrap());
    let cwd = fs::read_to_string(image_dir.join("cwd.txt")).unwrap();
    assert_eq!(
        Path::new(cwd.trim_end()),
        fs::canonicalize(&image_dir).unwrap()
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_post_image_script_failure() {
    let tmp = TempDir::new().unwrap();
    let (result, _) = run_with_post_image_script(&tmp, "echo script broke\nexit 4\n").await;

    match result.unwrap_err() {
        Error::Packaging(PackagingError::TaskFailed { source, .. }) => match *source {
            Error::Packaging(PackagingError::ToolFailed { code, output, .. }) => {
                assert_eq!(code, Some(4));
                assert!(output.contains("script broke"));
            }
            other => panic!("unexpected task error: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
}

fn runtime_app(runtime: Option<&Path>) -> Arc<Application> {
    let mut builder = ApplicationBuilder::new().name("jdk");
    if let Some(source) = runtime {
        builder = builder.runtime_builder(Arc::new(CopyRuntimeBuilder::new(source)));
    }
    Arc::new(builder.build().unwrap())
}

#[tokio::test]
async fn test_fresh_runtime_installer() {
    let tmp = TempDir::new().unwrap();
    let jdk = tmp.path().join("jdk");
    runtime_tree(&jdk);
    let app = runtime_app(Some(&jdk));
    let env = env_for(tmp.path(), &app);
    let pkg = Arc::new(PackageBuilder::new(app).package_type(package_type()).build().unwrap());
    assert!(pkg.is_runtime_installer());

    PackagingPipeline::standard()
        .unwrap()
        .execute_package(&env, pkg.clone(), tmp.path().join("out"))
        .await
        .unwrap();

    let layout = pkg.package_layout_at(env.app_image_dir()).unwrap();
    assert!(layout.runtime_directory().join("release").is_file());
    let build = tmp.path().join("build");
    assert_eq!(files_named(&build, PACKAGE_FILE), 0);
    assert_eq!(files_named(&build, AppImageFile::FILE_NAME), 0);
}

#[tokio::test]
async fn test_predefined_runtime_installer() {
    let tmp = TempDir::new().unwrap();
    let app = runtime_app(None);
    let env = env_for(tmp.path(), &app);
    let image_dir = tmp.path().join("runtime-image");
    let pkg = Arc::new(
        PackageBuilder::new(app)
            .package_type(package_type())
            .predefined_app_image(&image_dir)
            .build()
            .unwrap(),
    );
    // No app image file: runtime images are not checked for one
    runtime_tree(pkg.app_layout_at(&image_dir).unwrap().runtime_directory());

    let pipeline = PackagingPipeline::standard().unwrap();
    let params = pipeline
        .create_startup_parameters(&env, pkg, tmp.path().join("out"))
        .unwrap();
    assert_eq!(params.mode(), PipelineMode::PackageFromExistingImage);
    let staged = params.env().app_image_layout().clone();
    pipeline.execute(params).await.unwrap();

    assert!(staged.runtime_directory().join("bin/java").is_file());
    assert_eq!(files_named(&tmp.path().join("build"), PACKAGE_FILE), 0);
}
