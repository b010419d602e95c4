//! The `.jpackage.xml` metadata file of an application image.
//!
//! Every application image carries a small XML document in its app directory
//! recording the creator platform and version, the application version and the
//! launchers. Packaging a predefined image reads it back to recover the
//! launcher list; an image written by another platform or packager version is
//! rejected.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <jpackage-state version="0.1.0" platform="linux">
//!   <app-version>1.0</app-version>
//!   <main-launcher name="Foo">
//!     <service>false</service>
//!     <main-class>m.Main</main-class>
//!   </main-launcher>
//! </jpackage-state>
//! ```

use crate::{
    error::{AppImageFileError, Context, PackagingError, Result},
    layout::ApplicationLayout,
    model::{Application, Launcher},
    platform::OperatingSystem,
    utils::fs,
};
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

const ROOT: &str = "jpackage-state";
const APP_VERSION: &str = "app-version";
const MAIN_LAUNCHER: &str = "main-launcher";
const ADD_LAUNCHER: &str = "add-launcher";
const SERVICE: &str = "service";
const MAIN_CLASS: &str = "main-class";

/// Checks that `key` can be stored as an app-level extra element.
///
/// Keys naming a document element of their own would be read back as that
/// element.
pub fn check_app_extra_key(key: &str) -> std::result::Result<(), String> {
    check_extra_key(key, &[APP_VERSION, MAIN_LAUNCHER, ADD_LAUNCHER])
}

/// Checks that `key` can be stored as an extra element of a launcher.
pub fn check_launcher_extra_key(key: &str) -> std::result::Result<(), String> {
    check_extra_key(key, &[SERVICE])
}

fn check_extra_key(key: &str, reserved: &[&str]) -> std::result::Result<(), String> {
    if reserved.contains(&key) {
        return Err(format!("'{key}' is reserved in {}", AppImageFile::FILE_NAME));
    }
    let mut chars = key.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid_start || !valid_rest || key.to_ascii_lowercase().starts_with("xml") {
        return Err(format!("'{key}' is not a valid element name"));
    }
    Ok(())
}

/// Platform and version of the process writing or reading an app image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorInfo {
    os: OperatingSystem,
    version: String,
}

impl CreatorInfo {
    /// Creator with an explicit platform and version.
    pub fn new(os: OperatingSystem, version: impl Into<String>) -> Self {
        Self {
            os,
            version: version.into(),
        }
    }

    /// This build of the packager on the current platform.
    pub fn current() -> Self {
        Self::new(OperatingSystem::current(), env!("CARGO_PKG_VERSION"))
    }

    /// Platform.
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    /// Packager version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for CreatorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.platform_token(), self.version)
    }
}

/// Launcher entry of the metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherInfo {
    name: String,
    service: bool,
    extra: BTreeMap<String, String>,
}

impl LauncherInfo {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, service: bool, extra: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            service,
            extra,
        }
    }

    fn from_launcher(launcher: &Launcher) -> Self {
        let mut extra = launcher.extra_app_image_file_data().clone();
        if let Some(info) = launcher.startup_info() {
            extra.insert(MAIN_CLASS.to_string(), info.qualified_class_name().to_string());
        }
        Self::new(launcher.name(), launcher.is_service(), extra)
    }

    /// Launcher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the launcher is a service.
    pub fn is_service(&self) -> bool {
        self.service
    }

    /// Remaining key/value pairs, including `main-class`.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Converts the entry back into a launcher without startup info.
    pub fn to_launcher(&self) -> Launcher {
        self.extra.iter().fold(
            Launcher::new(&self.name).with_service(self.service),
            |launcher, (key, value)| launcher.with_extra_app_image_file_data(key, value),
        )
    }
}

/// Contents of `.jpackage.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppImageFile {
    creator: CreatorInfo,
    app_version: String,
    extra: BTreeMap<String, String>,
    main_launcher: LauncherInfo,
    additional_launchers: Vec<LauncherInfo>,
}

impl AppImageFile {
    /// File name inside the app directory.
    pub const FILE_NAME: &'static str = ".jpackage.xml";

    /// Creates the metadata of an application.
    pub fn from_application(app: &Application) -> Result<Self> {
        let main = app
            .main_launcher()
            .context("runtime images have no app image file")?;
        Ok(Self {
            creator: CreatorInfo::current(),
            app_version: app.version().to_string(),
            extra: app.extra_app_image_file_data().clone(),
            main_launcher: LauncherInfo::from_launcher(main),
            additional_launchers: app
                .additional_launchers()
                .iter()
                .map(LauncherInfo::from_launcher)
                .collect(),
        })
    }

    /// Replaces the recorded creator.
    pub fn with_creator(mut self, creator: CreatorInfo) -> Self {
        self.creator = creator;
        self
    }

    /// Location of the file in an app image.
    pub fn path_in(layout: &ApplicationLayout) -> PathBuf {
        layout.app_directory().join(Self::FILE_NAME)
    }

    /// Creator platform and version.
    pub fn creator(&self) -> &CreatorInfo {
        &self.creator
    }

    /// Application name, which is the main launcher name.
    pub fn app_name(&self) -> &str {
        &self.main_launcher.name
    }

    /// Application version.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// App-level extra key/value pairs.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Main launcher entry.
    pub fn main_launcher(&self) -> &LauncherInfo {
        &self.main_launcher
    }

    /// Additional launcher entries in file order.
    pub fn additional_launchers(&self) -> &[LauncherInfo] {
        &self.additional_launchers
    }

    /// All launchers as models, main launcher first.
    pub fn launchers(&self) -> Vec<Launcher> {
        std::iter::once(&self.main_launcher)
            .chain(&self.additional_launchers)
            .map(LauncherInfo::to_launcher)
            .collect()
    }

    /// Serializes the document.
    pub fn to_xml(&self) -> std::result::Result<String, String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| e.to_string())?;

        let mut root = BytesStart::new(ROOT);
        root.push_attribute(("version", self.creator.version()));
        root.push_attribute(("platform", self.creator.os().platform_token()));
        writer
            .write_event(Event::Start(root))
            .map_err(|e| e.to_string())?;

        write_text_element(&mut writer, APP_VERSION, &self.app_version)?;
        for (key, value) in &self.extra {
            write_text_element(&mut writer, key, value)?;
        }
        write_launcher(&mut writer, MAIN_LAUNCHER, &self.main_launcher)?;
        for launcher in &self.additional_launchers {
            write_launcher(&mut writer, ADD_LAUNCHER, launcher)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(|e| e.to_string())?;
        String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
    }

    /// Writes the document into the app directory of `layout`.
    pub fn save(&self, layout: &ApplicationLayout) -> Result<()> {
        let path = Self::path_in(layout);
        let xml = self.to_xml().map_err(|reason| PackagingError::Xml {
            path: path.clone(),
            reason,
        })?;
        fs::write_file(&path, xml)
    }

    /// Loads the document of the image at `layout`, validated against the
    /// current creator.
    pub fn load(layout: &ApplicationLayout) -> Result<Self> {
        Self::load_with(layout, &CreatorInfo::current())
    }

    /// Loads the document of the image at `layout`, validated against
    /// `creator`.
    pub fn load_with(layout: &ApplicationLayout, creator: &CreatorInfo) -> Result<Self> {
        let path = Self::path_in(layout);
        if !path.is_file() {
            return Err(AppImageFileError::Missing { path }.into());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| AppImageFileError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse(&path, &text, creator)?)
    }

    /// Parses and validates a document read from `path`.
    pub fn parse(
        path: &Path,
        text: &str,
        creator: &CreatorInfo,
    ) -> std::result::Result<Self, AppImageFileError> {
        let root = Element::parse(text).map_err(|reason| AppImageFileError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
        let invalid = |reason: String| AppImageFileError::InvalidSchema {
            path: path.to_path_buf(),
            reason,
        };

        if root.name != ROOT {
            return Err(invalid(format!("unexpected root element <{}>", root.name)));
        }
        let version = root
            .attribute("version")
            .ok_or_else(|| invalid("missing version attribute".into()))?;
        let platform = root
            .attribute("platform")
            .ok_or_else(|| invalid("missing platform attribute".into()))?;
        if platform != creator.os().platform_token() || version != creator.version() {
            return Err(AppImageFileError::ForeignImage {
                path: path.to_path_buf(),
                expected: creator.to_string(),
                found: format!("{platform}/{version}"),
            });
        }

        let mut app_version = None;
        let mut extra = BTreeMap::new();
        let mut main_launcher = None;
        let mut additional_launchers = Vec::new();
        for child in &root.children {
            match child.name.as_str() {
                APP_VERSION => app_version = Some(child.text.clone()),
                MAIN_LAUNCHER => {
                    if main_launcher.is_some() {
                        return Err(invalid("more than one main launcher".into()));
                    }
                    main_launcher = Some(child.to_launcher_info().map_err(&invalid)?);
                }
                ADD_LAUNCHER => additional_launchers.push(child.to_launcher_info().map_err(&invalid)?),
                _ if child.children.is_empty() => {
                    extra.insert(child.name.clone(), child.text.clone());
                }
                other => log::warn!("Ignoring unknown element <{other}> in {}", path.display()),
            }
        }

        Ok(Self {
            creator: creator.clone(),
            app_version: app_version
                .filter(|v| !v.is_empty())
                .ok_or_else(|| invalid(format!("missing <{APP_VERSION}>")))?,
            extra,
            main_launcher: main_launcher
                .ok_or_else(|| invalid(format!("missing <{MAIN_LAUNCHER}>")))?,
            additional_launchers,
        })
    }
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> std::result::Result<(), String> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn write_launcher(
    writer: &mut Writer<Vec<u8>>,
    element: &str,
    launcher: &LauncherInfo,
) -> std::result::Result<(), String> {
    let mut start = BytesStart::new(element);
    start.push_attribute(("name", launcher.name.as_str()));
    writer
        .write_event(Event::Start(start))
        .map_err(|e| e.to_string())?;
    write_text_element(writer, SERVICE, if launcher.service { "true" } else { "false" })?;
    for (key, value) in &launcher.extra {
        write_text_element(writer, key, value)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element)))
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Minimal element tree used for validation.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;
            match event {
                Event::Start(start) => stack.push(Self::open(&start)?),
                Event::Empty(start) => {
                    let element = Self::open(&start)?;
                    Self::close(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or("unbalanced end tag")?;
                    Self::close(element, &mut stack, &mut root)?;
                }
                Event::Text(content) => {
                    if let Some(current) = stack.last_mut() {
                        let unescaped = content.unescape().map_err(|e| e.to_string())?;
                        current.text.push_str(&unescaped);
                    }
                }
                Event::CData(content) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&content.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !stack.is_empty() {
            return Err("unexpected end of document".to_string());
        }
        root.ok_or_else(|| "no root element".to_string())
    }

    fn open(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    /// Only leaf elements keep their text; anything else is indentation.
    fn close(
        mut element: Self,
        stack: &mut [Element],
        root: &mut Option<Element>,
    ) -> std::result::Result<(), String> {
        if !element.children.is_empty() {
            element.text.clear();
        }
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => return Err("more than one root element".to_string()),
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn to_launcher_info(&self) -> std::result::Result<LauncherInfo, String> {
        let name = self
            .attribute("name")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("<{}> without a name", self.name))?;
        let mut service = false;
        let mut extra = BTreeMap::new();
        for child in &self.children {
            if child.name == SERVICE {
                service = child.text.trim() == "true";
            } else {
                extra.insert(child.name.clone(), child.text.clone());
            }
        }
        Ok(LauncherInfo::new(name, service, extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApplicationBuilder, LauncherStartupInfo};

    fn sample_app() -> Application {
        ApplicationBuilder::new()
            .name("Foo")
            .version("2.5")
            .extra_app_image_file_data("signed", "false")
            .launcher(
                Launcher::new("Foo")
                    .with_startup_info(LauncherStartupInfo::module("m", "m.Main")),
            )
            .launcher(
                Launcher::new("Bar")
                    .with_service(true)
                    .with_extra_app_image_file_data("description", "a & b"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_document_shape() {
        let file = AppImageFile::from_application(&sample_app())
            .unwrap()
            .with_creator(CreatorInfo::new(OperatingSystem::Linux, "9.9"));
        let xml = file.to_xml().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<jpackage-state version=\"9.9\" platform=\"linux\">"));
        assert!(xml.contains("<app-version>2.5</app-version>"));
        assert!(xml.contains("<main-launcher name=\"Foo\">"));
        assert!(xml.contains("<main-class>m.Main</main-class>"));
        assert!(xml.contains("<add-launcher name=\"Bar\">"));
        assert!(xml.contains("<description>a &amp; b</description>"));
        assert!(xml.find("<signed>").unwrap() < xml.find("<main-launcher").unwrap());
    }

    #[test]
    fn test_parse_recovers_document() {
        let creator = CreatorInfo::new(OperatingSystem::Linux, "9.9");
        let file = AppImageFile::from_application(&sample_app())
            .unwrap()
            .with_creator(creator.clone());
        let parsed =
            AppImageFile::parse(Path::new("x.xml"), &file.to_xml().unwrap(), &creator).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(parsed.app_name(), "Foo");
        let launchers = parsed.launchers();
        assert_eq!(launchers.len(), 2);
        assert!(launchers[1].is_service());
    }

    #[test]
    fn test_padded_values_survive_parse() {
        let creator = CreatorInfo::new(OperatingSystem::Linux, "9.9");
        let app = ApplicationBuilder::new()
            .name("Foo")
            .version(" 2.5 ")
            .extra_app_image_file_data("note", "  padded ")
            .extra_app_image_file_data("blank", "   ")
            .launcher(
                Launcher::new("Foo")
                    .with_startup_info(LauncherStartupInfo::module("m", "m.Main"))
                    .with_extra_app_image_file_data("description", " lead"),
            )
            .build()
            .unwrap();
        let file = AppImageFile::from_application(&app)
            .unwrap()
            .with_creator(creator.clone());

        let parsed =
            AppImageFile::parse(Path::new("x.xml"), &file.to_xml().unwrap(), &creator).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(parsed.app_version(), " 2.5 ");
        assert_eq!(parsed.extra()["note"], "  padded ");
        assert_eq!(parsed.main_launcher().extra()["description"], " lead");
    }

    #[test]
    fn test_extra_key_names() {
        assert!(check_app_extra_key("signed").is_ok());
        assert!(check_app_extra_key("_x.y-z").is_ok());
        assert!(check_app_extra_key("app-version").is_err());
        assert!(check_app_extra_key("XmlThing").is_err());
        assert!(check_app_extra_key("a:b").is_err());
        assert!(check_launcher_extra_key("service").is_err());
        assert!(check_launcher_extra_key("app-version").is_ok());
    }

    #[test]
    fn test_foreign_platform_rejected() {
        let xml = r#"<jpackage-state version="1" platform="windows">
            <app-version>1.0</app-version>
            <main-launcher name="Foo"><service>false</service></main-launcher>
        </jpackage-state>"#;
        let err = AppImageFile::parse(
            Path::new("x.xml"),
            xml,
            &CreatorInfo::new(OperatingSystem::Linux, "1"),
        )
        .unwrap_err();
        assert!(matches!(err, AppImageFileError::ForeignImage { .. }));
    }

    #[test]
    fn test_schema_and_syntax_errors() {
        let creator = CreatorInfo::new(OperatingSystem::Linux, "1");
        let cases = [
            ("<jpackage-state", true),
            ("<jpackage-state><a></b></jpackage-state>", true),
            ("<other/>", false),
            (
                r#"<jpackage-state version="1" platform="linux"><app-version>1</app-version></jpackage-state>"#,
                false,
            ),
            (
                r#"<jpackage-state version="1" platform="linux"><main-launcher name="A"/></jpackage-state>"#,
                false,
            ),
        ];
        for (xml, malformed) in cases {
            let err = AppImageFile::parse(Path::new("x.xml"), xml, &creator).unwrap_err();
            if malformed {
                assert!(matches!(err, AppImageFileError::Malformed { .. }), "{xml}: {err}");
            } else {
                assert!(matches!(err, AppImageFileError::InvalidSchema { .. }), "{xml}: {err}");
            }
        }
    }
}
