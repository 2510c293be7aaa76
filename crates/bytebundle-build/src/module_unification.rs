//! Built-in `module-unification` delegate
//!
//! Packs every registered template into a simple container and describes it
//! in a JavaScript data segment:
//!
//! ```text
//! "BBC\0" | version: u16 LE | count: u32 LE | entry*
//! entry = kind: u8 | path_len: u32 LE | path | payload_len: u32 LE | payload
//! ```
//!
//! Template payloads are the raw template source; AST payloads are compact
//! JSON. Entries are ordered by root-relative path and their position is
//! their handle.

use crate::asset::sha256_hex;
use crate::delegate::{BundleInput, CompiledOutput, CompilerDelegate, DelegateOptions, TemplateScope};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use bytebundle_config::BuiltinSpec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};

/// Container magic
pub const MAGIC: &[u8; 4] = b"BBC\0";

/// Container format version
pub const FORMAT_VERSION: u16 = 1;

/// Kind of a container entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Template = 0,
    Ast = 1,
}

impl EntryKind {
    fn from_byte(byte: u8) -> anyhow::Result<Self> {
        match byte {
            0 => Ok(Self::Template),
            1 => Ok(Self::Ast),
            other => bail!("unknown entry kind {}", other),
        }
    }
}

/// One decoded container entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub kind: EntryKind,
    pub path: String,
    pub payload: Vec<u8>,
}

/// Delegate for the module-unification project layout
#[derive(Debug)]
pub struct ModuleUnificationDelegate {
    options: DelegateOptions,
}

struct PendingEntry<'a> {
    path: String,
    kind: EntryKind,
    payload: Vec<u8>,
    scope: Option<&'a TemplateScope>,
}

#[derive(Serialize)]
struct DataSegment<'a> {
    heap: &'a str,
    table: Vec<TableEntry<'a>>,
    main: Option<usize>,
    builtins: &'a BTreeMap<String, BuiltinSpec>,
    checksum: String,
}

#[derive(Serialize)]
struct TableEntry<'a> {
    specifier: String,
    handle: usize,
    kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a TemplateScope>,
}

impl ModuleUnificationDelegate {
    /// Create a delegate from its construction options
    pub fn new(options: DelegateOptions) -> Self {
        Self { options }
    }

    /// Construction options
    pub fn options(&self) -> &DelegateOptions {
        &self.options
    }

    /// Root-relative, `/`-separated form of a registered path
    ///
    /// Relative paths are taken as already relative to the project root. Paths
    /// that leave the root or are not UTF-8 are rejected.
    fn relative_path(&self, path: &Path) -> anyhow::Result<String> {
        let root = &self.options.project_root;
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) if path.is_absolute() => bail!(
                "template '{}' is outside the project root '{}'",
                path.display(),
                root.display()
            ),
            Err(_) => path,
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(
                    part.to_str()
                        .ok_or_else(|| anyhow!("template path '{}' is not valid UTF-8", path.display()))?,
                ),
                Component::CurDir => {}
                _ => bail!(
                    "template '{}' is outside the project root '{}'",
                    path.display(),
                    root.display()
                ),
            }
        }
        Ok(parts.join("/"))
    }

    fn collect_entries<'a>(&self, input: &BundleInput<'a>) -> anyhow::Result<Vec<PendingEntry<'a>>> {
        let mut entries = Vec::with_capacity(input.components.len() + input.asts.len());

        for component in input.components {
            entries.push(PendingEntry {
                path: self.relative_path(&component.path)?,
                kind: EntryKind::Template,
                payload: component.template.as_bytes().to_vec(),
                scope: (!component.scope.is_empty()).then_some(&component.scope),
            });
        }

        for ast in input.asts {
            let path = self.relative_path(&ast.path)?;
            let payload = serde_json::to_vec(&ast.ast)
                .with_context(|| format!("failed to serialize AST for '{}'", path))?;
            entries.push(PendingEntry {
                path,
                kind: EntryKind::Ast,
                payload,
                scope: None,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.cmp(&b.kind)));

        // One entry per specifier
        {
            let mut seen: HashMap<&str, &str> = HashMap::with_capacity(entries.len());
            for entry in &entries {
                if let Some(previous) = seen.insert(specifier(&entry.path), &entry.path) {
                    if previous == entry.path {
                        bail!("template '{}' was registered more than once", entry.path);
                    }
                    bail!(
                        "template '{}' was registered more than once (as '{}' and '{}')",
                        specifier(&entry.path),
                        previous,
                        entry.path
                    );
                }
            }
        }

        Ok(entries)
    }

    fn main_handle(&self, entries: &[PendingEntry<'_>]) -> anyhow::Result<Option<usize>> {
        let Some(locator) = &self.options.main_locator else {
            return Ok(None);
        };

        let module = locator.module.trim_start_matches("./");
        entries
            .iter()
            .position(|entry| entry.path == module || specifier(&entry.path) == module)
            .map(Some)
            .ok_or_else(|| {
                anyhow!(
                    "main template '{}' (export '{}') was not registered",
                    locator.module,
                    locator.name
                )
            })
    }
}

#[async_trait(?Send)]
impl CompilerDelegate for ModuleUnificationDelegate {
    async fn compile_bundle(&mut self, input: &BundleInput<'_>) -> anyhow::Result<CompiledOutput> {
        let entries = self.collect_entries(input)?;
        let main = self.main_handle(&entries)?;
        let bytecode = encode(&entries)?;

        let segment = DataSegment {
            heap: &self.options.output_files.bytecode,
            table: entries
                .iter()
                .enumerate()
                .map(|(handle, entry)| TableEntry {
                    specifier: specifier(&entry.path).to_string(),
                    handle,
                    kind: entry.kind,
                    scope: entry.scope,
                })
                .collect(),
            main,
            builtins: &self.options.builtins,
            checksum: sha256_hex(&bytecode),
        };

        let json = serde_json::to_string(&segment).context("failed to serialize data segment")?;

        Ok(CompiledOutput {
            bytecode,
            data_segment: format!("export default {};\n", json),
        })
    }
}

/// Path without its final extension
fn specifier(path: &str) -> &str {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

fn encode(entries: &[PendingEntry<'_>]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&len_u32(entries.len())?.to_le_bytes());

    for entry in entries {
        out.push(entry.kind as u8);
        write_chunk(&mut out, entry.path.as_bytes())?;
        write_chunk(&mut out, &entry.payload)?;
    }

    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, bytes: &[u8]) -> anyhow::Result<()> {
    out.extend_from_slice(&len_u32(bytes.len())?.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn len_u32(len: usize) -> anyhow::Result<u32> {
    u32::try_from(len).map_err(|_| anyhow!("length {} does not fit the container format", len))
}

/// Decode a container produced by this delegate
pub fn read_container(bytes: &[u8]) -> anyhow::Result<Vec<ContainerEntry>> {
    let mut cursor = Cursor { bytes, pos: 0 };

    if cursor.take(4)? != MAGIC {
        bail!("not a bytebundle container");
    }
    let version = u16::from_le_bytes([cursor.byte()?, cursor.byte()?]);
    if version != FORMAT_VERSION {
        bail!("unsupported container version {}", version);
    }

    let count = cursor.u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let kind = EntryKind::from_byte(cursor.byte()?)?;
        let path_len = cursor.u32()? as usize;
        let path = String::from_utf8(cursor.take(path_len)?.to_vec()).context("entry path is not UTF-8")?;
        let payload_len = cursor.u32()? as usize;
        let payload = cursor.take(payload_len)?.to_vec();
        entries.push(ContainerEntry { kind, path, payload });
    }

    if cursor.pos != bytes.len() {
        bail!("{} trailing bytes after last entry", bytes.len() - cursor.pos);
    }

    Ok(entries)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> anyhow::Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| anyhow!("container truncated at byte {}", self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> anyhow::Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> anyhow::Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}
