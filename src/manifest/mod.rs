//! Manifest serializer.
//!
//! Renders a [`PackageModel`] into a `.nuspec` document.

use std::io;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::package::{DependencyModel, PackageModel};

pub const NUSPEC_NAMESPACE: &str = "http://schemas.microsoft.com/packaging/2012/06/nuspec.xsd";

/// Render the manifest for `package` as UTF-8 bytes.
pub fn render(package: &PackageModel) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("package").with_attributes([("xmlns", NUSPEC_NAMESPACE)]),
    ))?;

    write_metadata(&mut writer, package)?;
    write_files(&mut writer, package)?;

    writer.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(writer.into_inner())
}

fn write_metadata<W: io::Write>(writer: &mut Writer<W>, package: &PackageModel) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;

    write_text(writer, "id", &package.id)?;
    write_optional(writer, "title", package.title.as_deref())?;
    write_optional(writer, "description", package.description.as_deref())?;
    write_optional(writer, "copyright", package.copyright.as_deref())?;
    if !package.version.is_empty() {
        write_text(writer, "version", &package.version.to_string())?;
    }
    write_list(writer, "authors", &package.authors)?;
    write_list(writer, "owners", &package.owners)?;
    write_optional(writer, "projectUrl", package.project_url.as_ref().map(|u| u.as_str()))?;
    if let Some(license_url) = &package.license_url {
        write_text(writer, "licenseUrl", license_url.as_str())?;
        write_text(writer, "requireLicenseAcceptance", "true")?;
    }
    write_optional(writer, "iconUrl", package.icon_url.as_ref().map(|u| u.as_str()))?;
    if let Some(language) = &package.language {
        write_text(writer, "language", &language.to_string())?;
    }
    write_list(writer, "tags", &package.tags)?;
    write_dependencies(writer, package)?;

    writer.write_event(Event::End(BytesEnd::new("metadata")))?;
    Ok(())
}

fn write_dependencies<W: io::Write>(writer: &mut Writer<W>, package: &PackageModel) -> Result<()> {
    if package.dependencies.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("dependencies")))?;

    for (framework, members) in package.framework_groups() {
        writer.write_event(Event::Start(
            BytesStart::new("group").with_attributes([("targetFramework", framework)]),
        ))?;
        for dependency in members {
            write_dependency(writer, dependency)?;
        }
        writer.write_event(Event::End(BytesEnd::new("group")))?;
    }
    for dependency in package.common_dependencies() {
        write_dependency(writer, dependency)?;
    }

    writer.write_event(Event::End(BytesEnd::new("dependencies")))?;
    Ok(())
}

fn write_dependency<W: io::Write>(writer: &mut Writer<W>, dependency: &DependencyModel) -> Result<()> {
    let mut element = BytesStart::new("dependency");
    element.push_attribute(("id", dependency.id.as_str()));
    if !dependency.range.is_any() {
        element.push_attribute(("version", dependency.range.to_string().as_str()));
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn write_files<W: io::Write>(writer: &mut Writer<W>, package: &PackageModel) -> Result<()> {
    if package.files.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("files")))?;
    for file in &package.files {
        let target = file.folder.to_string();
        writer.write_event(Event::Empty(
            BytesStart::new("file").with_attributes([("src", file.pattern.as_str()), ("target", target.as_str())]),
        ))?;
    }
    writer.write_event(Event::End(BytesEnd::new("files")))?;
    Ok(())
}

fn write_text<W: io::Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_optional<W: io::Write>(writer: &mut Writer<W>, name: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => write_text(writer, name, value),
        None => Ok(()),
    }
}

fn write_list<W: io::Write>(writer: &mut Writer<W>, name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    write_text(writer, name, &values.join(","))
}
