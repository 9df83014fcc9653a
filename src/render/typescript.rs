//! TypeScript backend
//!
//! Structural types plus builder objects on top of the wueste runtime.
//! Every object schema becomes one module exporting the view, param and
//! wire interfaces, a reflection schema, a getter walker, a builder and a
//! factory registered with `WuestenTypeRegistry`.

use super::arrays::{member_object, ArrayPlan};
use super::{
    check_member_names, provenance_lines, source_name, Backend, GenerateContext, GeneratedUnit,
    Language, RenderConfig,
};
use crate::error::{Error, Result};
use crate::property::{
    NodeId, Property, PropertyItem, PropertyKind, PropertyObject, SchemaGraph, StringFormat,
};
use crate::util::{file_stem, quote, ts_private_name, ts_public_name};
use crate::wl;
use crate::writer::BlockWriter;
use genco::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

const RESULT_IMPORT: &str = "Result as WuesteResult";

/// Builder members a schema member must not shadow
const BUILDER_MEMBERS: &[&str] = &[
    "param",
    "CoerceAttribute",
    "Coerce",
    "Get",
    "ToObject",
    "ToPayload",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptBackend;

impl Backend for TypeScriptBackend {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn file_name(&self, graph: &SchemaGraph, object: NodeId) -> String {
        format!("{}.ts", file_stem(&object_name(graph, object)))
    }

    fn generate(&mut self, ctx: &GenerateContext<'_>, object: NodeId) -> Result<GeneratedUnit> {
        let schema = ctx.graph.object(object).ok_or_else(|| {
            Error::UnsupportedShape(format!("{} is a {}, not an object", object, ctx.graph.kind(object)))
        })?;
        validate(ctx.graph, schema)?;

        let unit = TsUnit::new(ctx.graph, ctx.config, object, schema);
        unit.emit();
        let contents = unit.finish()?;
        Ok(GeneratedUnit {
            file_name: self.file_name(ctx.graph, object),
            contents,
            discovered: schema
                .items
                .iter()
                .filter_map(|item| member_object(ctx.graph, item.property))
                .collect(),
            source: source_name(ctx.graph, object),
        })
    }
}

/// Titles of the enclosing objects joined by `$`, up to the file root
pub fn object_name(graph: &SchemaGraph, id: NodeId) -> String {
    let mut titles = Vec::new();
    let mut current = Some(id);
    let mut steps = 0;
    while let Some(node) = current {
        if let Some(object) = graph.object(node) {
            if !object.title().is_empty() {
                titles.push(object.title());
            }
        }
        steps += 1;
        if graph.meta(node).file_root || steps > graph.len() {
            break;
        }
        current = graph.parent(node);
    }
    titles.reverse();
    ts_public_name(&titles.join("$"))
}

fn validate(graph: &SchemaGraph, schema: &PropertyObject) -> Result<()> {
    if schema.title().is_empty() {
        return Err(Error::UnsupportedShape(format!(
            "object {:?} needs a title to name typescript types",
            schema.id()
        )));
    }
    check_member_names(schema, ts_public_name)?;
    for item in &schema.items {
        let path = format!("{}.{}", schema.title(), item.name);
        if BUILDER_MEMBERS.contains(&ts_public_name(&item.name).as_str()) {
            return Err(Error::UnsupportedShape(format!(
                "{path}: member name collides with a builder method"
            )));
        }
        match graph.property(graph.array_leaf(item.property)) {
            Property::String(s) => {
                if let Some(format @ (StringFormat::Date | StringFormat::Time)) = &s.format {
                    return Err(Error::UnsupportedShape(format!(
                        "{path}: string format {} is not supported",
                        format.as_str()
                    )));
                }
            }
            Property::Object(o) if o.has_members() && o.title().is_empty() => {
                return Err(Error::UnsupportedShape(format!(
                    "{path}: object {:?} needs a title",
                    o.id()
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn is_date_time(property: &Property) -> bool {
    matches!(property, Property::String(s) if s.format == Some(StringFormat::DateTime))
}

fn leaf_format(property: &Property) -> Option<&str> {
    match property {
        Property::String(s) => s.format.as_ref().map(|f| f.as_str()),
        Property::Integer(i) => i.format.as_ref().map(|f| f.as_str()),
        Property::Number(n) => n.format.as_ref().map(|f| f.as_str()),
        _ => None,
    }
}

/// `obj.member`, or `obj["member"]` when the member name had to be quoted
fn access(obj: &str, member: &str) -> String {
    if member.starts_with('"') {
        format!("{obj}[{member}]")
    } else {
        format!("{obj}.{member}")
    }
}

struct TsUnit<'a> {
    graph: &'a SchemaGraph,
    config: &'a RenderConfig,
    schema: &'a PropertyObject,
    name: String,
    /// Import source to imported names
    imports: RefCell<BTreeMap<String, BTreeSet<String>>>,
    w: BlockWriter,
    object: NodeId,
}

impl<'a> TsUnit<'a> {
    fn new(
        graph: &'a SchemaGraph,
        config: &'a RenderConfig,
        object: NodeId,
        schema: &'a PropertyObject,
    ) -> Self {
        Self {
            graph,
            config,
            schema,
            name: object_name(graph, object),
            imports: RefCell::new(BTreeMap::new()),
            w: BlockWriter::new(config.indent.clone()),
            object,
        }
    }

    fn add_import(&self, from: &str, name: &str) {
        self.imports
            .borrow_mut()
            .entry(from.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Runtime symbol, imported from the configured wueste module
    fn rt(&self, name: &str) -> String {
        self.add_import(&self.config.from_wueste, name);
        name.to_string()
    }

    fn result(&self) -> &'static str {
        self.add_import(&self.config.from_result, RESULT_IMPORT);
        "WuesteResult"
    }

    /// Generated symbol of another object schema, imported from its module
    fn object_symbol(&self, id: NodeId, suffix: &str) -> String {
        let name = object_name(self.graph, id);
        let symbol = format!("{name}{suffix}");
        let own = file_stem(&self.name);
        let other = file_stem(&name);
        if own != other {
            self.add_import(&format!("./{other}"), &symbol);
        }
        symbol
    }

    fn named(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.name)
    }

    fn view_type(&self, id: NodeId) -> String {
        match self.graph.property(id) {
            p @ Property::String(_) if is_date_time(p) => "Date".to_string(),
            Property::String(_) => "string".to_string(),
            Property::Integer(_) | Property::Number(_) => "number".to_string(),
            Property::Boolean(_) => "boolean".to_string(),
            Property::Array(a) => format!("{}[]", self.view_type(a.items)),
            Property::Object(o) if o.has_members() => self.object_symbol(id, ""),
            Property::Object(_) => self.rt("WuestenObject"),
        }
    }

    fn coerce_type(&self, id: NodeId) -> String {
        match self.graph.property(id) {
            p @ Property::String(_) if is_date_time(p) => self.rt("WuesteCoerceTypeDate"),
            Property::String(_) => self.rt("WuesteCoerceTypestring"),
            Property::Integer(_) | Property::Number(_) => self.rt("WuesteCoerceTypenumber"),
            Property::Boolean(_) => self.rt("WuesteCoerceTypeboolean"),
            Property::Array(a) => format!("{}[]", self.coerce_type(a.items)),
            Property::Object(o) if o.has_members() => self.object_symbol(id, "CoerceType"),
            Property::Object(_) => self.rt("WuestenObject"),
        }
    }

    fn object_type(&self, id: NodeId) -> String {
        match self.graph.property(id) {
            Property::String(_) => "string".to_string(),
            Property::Integer(_) | Property::Number(_) => "number".to_string(),
            Property::Boolean(_) => "boolean".to_string(),
            Property::Array(a) => format!("{}[]", self.object_type(a.items)),
            Property::Object(o) if o.has_members() => self.object_symbol(id, "Object"),
            Property::Object(_) => self.rt("WuestenObject"),
        }
    }

    /// Coerce type accepted by a member's attribute
    fn attribute_input(&self, item: &PropertyItem) -> String {
        match self.graph.property(item.property) {
            Property::Array(_) => "unknown".to_string(),
            _ => self.coerce_type(item.property),
        }
    }

    fn optional_suffix(item: &PropertyItem) -> &'static str {
        if item.optional {
            " | undefined"
        } else {
            ""
        }
    }

    fn emit(&self) {
        self.emit_view();
        self.emit_param();
        self.emit_object();
        self.emit_to_object();
        self.emit_getter();
        self.emit_schema();
        self.emit_results();
        self.emit_coerce_type();
        for item in &self.schema.items {
            if matches!(self.graph.property(item.property), Property::Array(_)) {
                self.emit_array_coerce(item);
            }
        }
        self.emit_builder();
        self.emit_names();
        self.emit_factory();
    }

    fn emit_view(&self) {
        self.w.write_block("export interface", &self.name, |w| {
            for item in &self.schema.items {
                let typ = self.view_type(item.property);
                if item.optional {
                    wl!(w, "readonly {}?: {typ} | undefined;", ts_public_name(&item.name));
                } else {
                    wl!(w, "readonly {}: {typ};", ts_public_name(&item.name));
                }
            }
        });
        self.w.blank();
    }

    fn emit_param(&self) {
        self.w.write_block("export interface", &self.named("Param"), |w| {
            for item in &self.schema.items {
                let typ = self.coerce_type(item.property);
                let loose = item.optional || self.graph.property(item.property).has_default();
                let mark = if loose { "?" } else { "" };
                wl!(w, "readonly {}{mark}: {typ};", ts_public_name(&item.name));
            }
        });
        self.w.blank();
    }

    fn emit_object(&self) {
        self.w.write_block("export interface", &self.named("Object"), |w| {
            for item in &self.schema.items {
                let typ = self.object_type(item.property);
                let mark = if item.optional { "?" } else { "" };
                wl!(w, "readonly {}{mark}: {typ};", quote(&item.name));
            }
        });
        self.w.blank();
    }

    fn needs_conversion(&self, id: NodeId) -> bool {
        let leaf = self.graph.array_leaf(id);
        is_date_time(self.graph.property(leaf)) || member_object(self.graph, leaf).is_some()
    }

    /// Wire form of `v`; arrays that need element conversion are rebuilt first
    fn to_object_value(&self, w: &BlockWriter, id: NodeId, v: &str, level: usize) -> String {
        match self.graph.property(id) {
            p @ Property::String(_) if is_date_time(p) => format!("{v}.toISOString()"),
            Property::Object(o) if o.has_members() => {
                format!("{}.ToObject({v})", self.object_symbol(id, "Factory"))
            }
            Property::Array(a) if self.needs_conversion(id) => {
                let o = format!("o{level}");
                let e = format!("e{level}");
                wl!(w, "const {o}: {} = [];", self.object_type(id));
                w.write_block("for", &format!("(const {e} of {v})"), |w| {
                    let element = self.to_object_value(w, a.items, &e, level + 1);
                    wl!(w, "{o}.push({element});");
                });
                o
            }
            _ => v.to_string(),
        }
    }

    fn emit_to_object(&self) {
        let signature = format!(
            "function {}(v0: {}): {}",
            self.named("ToObject"),
            self.name,
            self.named("Object")
        );
        self.w.write_block("export", &signature, |w| {
            w.write_line("const ret: Record<string, unknown> = {};");
            for item in &self.schema.items {
                let value = access("v0", &ts_public_name(&item.name));
                let key = quote(&item.name);
                let converts = self.graph.kind(item.property) == PropertyKind::Array
                    && self.needs_conversion(item.property);
                if item.optional {
                    w.write_block("if", &format!("(typeof {value} !== \"undefined\")"), |w| {
                        let out = self.to_object_value(w, item.property, &value, 0);
                        wl!(w, "ret[{key}] = {out};");
                    });
                } else if converts {
                    w.write_block_with("", "", "{", "}", |w| {
                        let out = self.to_object_value(w, item.property, &value, 0);
                        wl!(w, "ret[{key}] = {out};");
                    });
                } else {
                    let out = self.to_object_value(w, item.property, &value, 0);
                    wl!(w, "ret[{key}] = {out};");
                }
            }
            wl!(w, "return ret as unknown as {};", self.named("Object"));
        });
        self.w.blank();
    }

    fn getter_value(&self, w: &BlockWriter, id: NodeId, v: &str, level: &str, depth: usize) {
        match self.graph.property(id) {
            Property::Object(o) if o.has_members() => {
                wl!(w, "{}({v}, {level}).Apply(fn);", self.object_symbol(id, "Getter"));
            }
            Property::Array(a) => {
                let e = format!("e{depth}");
                w.write_block("for", &format!("(const {e} of {v})"), |w| {
                    self.getter_value(w, a.items, &e, level, depth + 1);
                });
            }
            _ => wl!(w, "fn({level}, {v});"),
        }
    }

    fn emit_getter(&self) {
        let reflection = self.rt("WuestenReflection");
        let builder = self.rt("WuestenGetterBuilder");
        let signature = format!(
            "function {}(v: {}, base: {reflection}[] = []): {builder}",
            self.named("Getter"),
            self.name
        );
        self.w.write_block("export", &signature, |w| {
            w.write_block_with("return", &format!("new {builder}((fn) =>"), " {", "});", |w| {
                wl!(w, "const items = {}.properties ?? [];", self.named("Schema"));
                for (idx, item) in self.schema.items.iter().enumerate() {
                    let value = access("v", &ts_public_name(&item.name));
                    let level = format!("[...base, {}, items[{idx}]]", self.named("Schema"));
                    if item.optional {
                        w.write_block("if", &format!("(typeof {value} !== \"undefined\")"), |w| {
                            self.getter_value(w, item.property, &value, &level, 0);
                        });
                    } else {
                        self.getter_value(w, item.property, &value, &level, 0);
                    }
                }
            });
        });
        self.w.blank();
    }

    /// Object literal body describing `id`; named objects are referenced
    fn schema_fields(&self, w: &BlockWriter, id: NodeId, path: &str) {
        let property = self.graph.property(id);
        match property {
            Property::Object(o) => {
                if !o.id().is_empty() {
                    wl!(w, "id: {},", quote(o.id()));
                }
                w.write_line("type: \"object\",");
                if let Some(schema) = &o.schema {
                    wl!(w, "schema: {},", quote(schema));
                }
                if !o.title().is_empty() {
                    wl!(w, "title: {},", quote(o.title()));
                }
                if !o.required().is_empty() {
                    let required: Vec<String> = o.required().iter().map(|r| quote(r)).collect();
                    wl!(w, "required: [{}],", required.join(", "));
                }
                if o.has_members() {
                    w.write_block_with("properties:", "", " [", "],", |w| {
                        for item in &o.items {
                            w.write_block_with("", "", "{", "},", |w| {
                                w.write_line("type: \"objectitem\",");
                                wl!(w, "name: {},", quote(&item.name));
                                let path = format!("{path}.{}", item.name);
                                self.schema_value(w, "property", item.property, &path);
                            });
                        }
                    });
                }
            }
            Property::Array(a) => {
                wl!(w, "id: {},", quote(path));
                w.write_line("type: \"array\",");
                self.schema_value(w, "items", a.items, path);
            }
            leaf => {
                wl!(w, "type: {},", quote(leaf.kind().as_str()));
                if let Some(format) = leaf_format(leaf) {
                    wl!(w, "format: {},", quote(format));
                }
            }
        }
    }

    fn schema_value(&self, w: &BlockWriter, key: &str, id: NodeId, path: &str) {
        if member_object(self.graph, id) == Some(id) {
            wl!(w, "{key}: {},", self.object_symbol(id, "Schema"));
            return;
        }
        w.write_block_with(&format!("{key}:"), "", " {", "},", |w| {
            self.schema_fields(w, id, path);
        });
    }

    fn emit_schema(&self) {
        let signature = format!(
            "const {}: {} =",
            self.named("Schema"),
            self.rt("WuestenReflectionObject")
        );
        self.w.write_block_with("export", &signature, " {", "};", |w| {
            self.schema_fields(w, self.object, self.schema.title());
        });
        self.w.blank();
    }

    fn emit_results(&self) {
        self.w.write_block("interface", &self.named("Results"), |w| {
            for item in &self.schema.items {
                wl!(
                    w,
                    "readonly {}: {}<{}{}>;",
                    ts_private_name(&item.name),
                    self.result(),
                    self.view_type(item.property),
                    Self::optional_suffix(item)
                );
            }
        });
        self.w.blank();
    }

    fn emit_coerce_type(&self) {
        wl!(
            self.w,
            "export type {} = Partial<{}> | Partial<{}> | Partial<{}>;",
            self.named("CoerceType"),
            self.name,
            self.named("Param"),
            self.named("Object")
        );
        self.w.blank();
    }

    fn coerce_fn_name(&self, item: &PropertyItem) -> String {
        ts_public_name(&format!("{}${}Coerce", self.name, item.name))
    }

    /// Nested-array coercion: one loop per level, one leaf coercion
    fn emit_array_coerce(&self, item: &PropertyItem) {
        let plan = ArrayPlan::of(self.graph, item.property);
        let leaf_view = self.view_type(plan.leaf);
        let leaf_coerce = self.coerce_type(plan.leaf);
        let full = plan.ts_type(0, &leaf_view);
        let result = self.result();
        let signature = format!(
            "function {}(itemAttr: {}<{leaf_view}, {leaf_coerce}>, c0: unknown): {result}<{full}>",
            self.coerce_fn_name(item),
            self.rt("WuestenAttribute"),
        );
        self.w.write_block("", &signature, |w| {
            self.array_level(w, &plan, 0, "c0", &leaf_view, &leaf_coerce, &full);
            w.write_line("return WuesteResult.Ok(s0);");
        });
        self.w.blank();
    }

    #[allow(clippy::too_many_arguments)]
    fn array_level(
        &self,
        w: &BlockWriter,
        plan: &ArrayPlan,
        level: usize,
        src: &str,
        leaf_view: &str,
        leaf_coerce: &str,
        full: &str,
    ) {
        let r = format!("r{level}");
        let s = format!("s{level}");
        let t = format!("t{level}");
        let i = format!("i{level}");
        wl!(w, "const {r} = {}<unknown>({src});", self.rt("WuesteToIterator"));
        w.write_block("if", &format!("({r}.is_err())"), |w| {
            wl!(
                w,
                "return WuesteResult.Err(`it's not iterable on level {level}:${{{r}.unwrap_err()}}`);"
            );
        });
        wl!(w, "const {s}: {} = [];", plan.ts_type(level, leaf_view));
        wl!(w, "const {t} = {r}.unwrap();");
        let header = format!("(let {i} = {t}.next(); !{i}.done; {i} = {t}.next())");
        w.write_block("for", &header, |w| {
            if plan.is_innermost(level) {
                wl!(w, "const attrRes = itemAttr.Coerce({i}.value as {leaf_coerce});");
                w.write_block("if", "(attrRes.is_err())", |w| {
                    wl!(w, "return attrRes as unknown as WuesteResult<{full}>;");
                });
                wl!(w, "{s}.push(attrRes.unwrap());");
            } else {
                let value = format!("{i}.value");
                self.array_level(w, plan, level + 1, &value, leaf_view, leaf_coerce, full);
                wl!(w, "{s}.push(s{});", level + 1);
            }
        });
    }

    /// `{ jsonname, varname, base, default?, format? }` for a member
    fn attribute_param(&self, item: &PropertyItem, with_default: bool) -> String {
        let mut fields = vec![
            format!("jsonname: {}", quote(&item.name)),
            format!("varname: {}", quote(&ts_public_name(&item.name).replace('"', ""))),
            "base: baseName".to_string(),
        ];
        let property = self.graph.property(item.property);
        if with_default {
            if let Some(default) = property.default_json() {
                fields.push(format!("default: {default}"));
            }
        }
        if let Some(format) = leaf_format(property) {
            fields.push(format!("format: {}", quote(format)));
        }
        format!("{{ {} }}", fields.join(", "))
    }

    /// Attribute construction for a non-array member or an array leaf
    fn leaf_attribute(&self, item: &PropertyItem, id: NodeId, optional: bool) -> String {
        let wuesten = self.rt("wuesten");
        let opt = if optional { "Optional" } else { "" };
        let param = self.attribute_param(item, id == item.property);
        match self.graph.property(id) {
            p @ Property::String(_) if is_date_time(p) => {
                format!("{wuesten}.AttributeDateTime{opt}({param})")
            }
            Property::String(_) => format!("{wuesten}.AttributeString{opt}({param})"),
            Property::Integer(_) => format!("{wuesten}.AttributeInteger{opt}({param})"),
            Property::Number(_) => format!("{wuesten}.AttributeNumber{opt}({param})"),
            Property::Boolean(_) => format!("{wuesten}.AttributeBoolean{opt}({param})"),
            Property::Object(o) if o.has_members() => format!(
                "{wuesten}.AttributeObject{opt}<{}, {}, {}>({param}, {})",
                self.view_type(id),
                self.coerce_type(id),
                self.object_type(id),
                self.object_symbol(id, "Factory")
            ),
            Property::Object(_) => {
                let object = self.rt("WuestenObject");
                format!(
                    "{wuesten}.AttributeObject{opt}<{object}, {object}, {object}>({param}, {})",
                    self.rt("WuestenObjectFactory")
                )
            }
            Property::Array(_) => String::new(),
        }
    }

    fn member_init(&self, w: &BlockWriter, item: &PropertyItem) {
        let field = ts_private_name(&item.name);
        let Property::Array(_) = self.graph.property(item.property) else {
            wl!(w, "this.{field} = {};", self.leaf_attribute(item, item.property, item.optional));
            return;
        };
        let plan = ArrayPlan::of(self.graph, item.property);
        let item_attr = format!("{field}Item");
        wl!(w, "const {item_attr} = {};", self.leaf_attribute(item, plan.leaf, false));
        let attr = format!(
            "new {}<{}, unknown>({}, {{ coerce: (v: unknown) => {}({item_attr}, v) }})",
            self.rt("WuestenAttr"),
            self.view_type(item.property),
            self.attribute_param(item, false),
            self.coerce_fn_name(item)
        );
        if item.optional {
            wl!(w, "this.{field} = new {}({attr});", self.rt("WuestenAttrOptional"));
        } else {
            wl!(w, "this.{field} = {attr};");
        }
    }

    fn emit_builder(&self) {
        let builder = self.named("Builder");
        let coerce = self.named("CoerceType");
        let result = self.result();
        let header = format!(
            "class {builder} implements {}<{}, {coerce}>",
            self.rt("WuestenBuilder"),
            self.name
        );
        self.w.write_block("export", &header, |w| {
            wl!(w, "readonly param: {}<{}, {coerce}>;", self.rt("WuestenAttributeBase"), self.name);
            for item in &self.schema.items {
                let suffix = Self::optional_suffix(item);
                wl!(
                    w,
                    "readonly {}: {}<{}{suffix}, {}{suffix}>;",
                    ts_private_name(&item.name),
                    self.rt("WuestenAttribute"),
                    self.view_type(item.property),
                    self.attribute_input(item)
                );
            }
            w.blank();

            let ctor = format!(
                "(param?: {}<{}, {coerce}>)",
                self.rt("WuestenFactoryParam"),
                self.name
            );
            w.write_block("constructor", &ctor, |w| {
                wl!(
                    w,
                    "this.param = {}<{}, {coerce}>(",
                    self.rt("WuestenFactoryAttributeMerge"),
                    self.name
                );
                let args = w.indent();
                wl!(
                    args,
                    "{{ jsonname: {}, varname: {}, base: \"\" }},",
                    quote(self.schema.title()),
                    quote(&self.name)
                );
                wl!(
                    args,
                    "param as {}<{}, {coerce}>,",
                    self.rt("WuestenAttributeParameter"),
                    self.name
                );
                w.write_line(");");
                wl!(w, "const baseName = {}(this.param);", self.rt("WuestenAttributeName"));
                for item in &self.schema.items {
                    self.member_init(w, item);
                }
            });
            w.blank();

            w.write_block("", &format!("CoerceAttribute(value: unknown): {result}<{}>", self.name), |w| {
                w.write_block("if", "(!(typeof value === \"object\" && value !== null))", |w| {
                    w.write_line(
                        "return WuesteResult.Err(`Attribute[${WuestenAttributeName(this.param)}] is not an object:${value}`);",
                    );
                });
                w.write_line("const rec = value as Record<string, unknown>;");
                w.write_line("const jsVal = rec[this.param.jsonname] ?? rec[this.param.varname];");
                wl!(w, "return this.Coerce(jsVal as {coerce});");
            });
            w.blank();

            w.write_block("", &format!("Coerce(value: {coerce}): {result}<{}>", self.name), |w| {
                w.write_block("if", "(!(typeof value === \"object\" && value !== null))", |w| {
                    w.write_line(
                        "return WuesteResult.Err(`Attribute[${WuestenAttributeName(this.param)}] is not an object:${value}`);",
                    );
                });
                for item in &self.schema.items {
                    wl!(w, "this.{}.CoerceAttribute(value);", ts_private_name(&item.name));
                }
                w.write_line("return this.Get();");
            });
            w.blank();

            w.write_block("", &format!("Get(): {result}<{}>", self.name), |w| {
                w.write_block_with("return", &format!("{builder}._fromResults("), "{", "});", |w| {
                    for item in &self.schema.items {
                        let field = ts_private_name(&item.name);
                        wl!(w, "{field}: this.{field}.Get(),");
                    }
                });
            });
            w.blank();

            w.write_block("", &format!("ToObject(): {result}<{}>", self.named("Object")), |w| {
                w.write_line("const res = this.Get();");
                w.write_block("if", "(res.is_err())", |w| {
                    w.write_line("return WuesteResult.Err(res.unwrap_err());");
                });
                wl!(w, "return WuesteResult.Ok({}(res.unwrap()));", self.named("ToObject"));
            });
            w.blank();

            let signature = format!(
                "static _fromResults(results: {}): {result}<{}>",
                self.named("Results"),
                self.name
            );
            w.write_block("", &signature, |w| {
                w.write_line("const errors: string[] = [];");
                for item in &self.schema.items {
                    let field = format!("results.{}", ts_private_name(&item.name));
                    w.write_block("if", &format!("({field}.is_err())"), |w| {
                        wl!(w, "errors.push({field}.unwrap_err().message);");
                    });
                }
                w.write_block("if", "(errors.length)", |w| {
                    w.write_line("return WuesteResult.Err(errors.join(\"\\n\"));");
                });
                w.write_block_with("return", &format!("WuesteResult.Ok<{}>(", self.name), "{", "});", |w| {
                    for item in &self.schema.items {
                        wl!(
                            w,
                            "{}: results.{}.unwrap(),",
                            ts_public_name(&item.name),
                            ts_private_name(&item.name)
                        );
                    }
                });
            });
            w.blank();

            let signature = format!(
                "ToPayload(encoder = this.param.encoder): {result}<{}>",
                self.rt("WuestePayload")
            );
            w.write_block("", &signature, |w| {
                w.write_line("const res = this.Get();");
                w.write_block("if", "(res.is_err())", |w| {
                    w.write_line("return WuesteResult.Err(res.unwrap_err());");
                });
                wl!(w, "return {}.ToPayload(res.unwrap(), encoder);", self.named("Factory"));
            });

            for item in &self.schema.items {
                w.blank();
                self.emit_setter(w, item, &builder);
            }
        });
        self.w.blank();
    }

    fn emit_setter(&self, w: &BlockWriter, item: &PropertyItem, builder: &str) {
        let field = ts_private_name(&item.name);
        let view = self.view_type(item.property);
        let suffix = Self::optional_suffix(item);
        let signature = format!(
            "{}(v: {}{suffix} | {}<{view}>): {builder}",
            ts_public_name(&item.name),
            self.coerce_type(item.property),
            self.rt("WuestenFNGetBuilder")
        );
        let ret_val = self.rt("WuestenRetValType");
        w.write_block("", &signature, |w| {
            w.write_block("if", "(typeof v === \"function\")", |w| {
                wl!(w, "const val = this.{field}.Get();");
                w.write_line("const ret = v(val.is_ok() ? val.unwrap() : undefined);");
                w.write_block("if", &format!("(!(ret instanceof {ret_val}))"), |w| {
                    w.write_line("return this;");
                });
                wl!(w, "v = ret.Val as {view};");
            });
            wl!(w, "this.{field}.Coerce(v);");
            w.write_line("return this;");
        });
    }

    fn emit_names(&self) {
        let mut names: Vec<&str> = Vec::new();
        for name in [self.schema.id(), self.schema.title(), self.name.as_str()] {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        let names: Vec<String> = names.into_iter().map(quote).collect();
        let signature = format!("_{}: {} =", self.named("Names"), self.rt("WuestenNames"));
        self.w.write_block_with("const", &signature, " {", "};", |w| {
            wl!(w, "id: {},", quote(self.schema.id()));
            wl!(w, "title: {},", quote(self.schema.title()));
            wl!(w, "names: [{}],", names.join(", "));
            wl!(w, "varname: {},", quote(&self.name));
        });
        self.w.blank();
    }

    fn emit_factory(&self) {
        let factory_impl = self.named("FactoryImpl");
        let builder = self.named("Builder");
        let coerce = self.named("CoerceType");
        let object = self.named("Object");
        let names = format!("_{}", self.named("Names"));
        let result = self.result();
        let payload = self.rt("WuestePayload");
        let reflection = self.rt("WuestenReflection");
        let header = format!(
            "class {factory_impl} extends {}<{}, {coerce}, {object}>",
            self.rt("WuestenFactory"),
            self.name
        );
        self.w.write_block("export", &header, |w| {
            w.write_block("", &format!("Names(): {}", self.rt("WuestenNames")), |w| {
                wl!(w, "return {names};");
            });
            w.blank();

            let signature = format!(
                "Builder(param?: {}<{}, {coerce}>): {builder}",
                self.rt("WuestenFactoryParam"),
                self.name
            );
            w.write_block("", &signature, |w| {
                wl!(
                    w,
                    "return new {builder}({}(this._params, param as {}<unknown, unknown>));",
                    self.rt("WuestenFactoryAttributeMerge"),
                    self.rt("WuestenAttributeParameter")
                );
            });
            w.blank();

            let signature =
                format!("FromPayload(val: {payload}, decoder = this._params.decoder): {result}<{}>", self.name);
            w.write_block("", &signature, |w| {
                w.write_block("if", &format!("(!{names}.names.includes(val.Type))"), |w| {
                    wl!(
                        w,
                        "return WuesteResult.Err(new Error(`{}: invalid Payload Type:${{val.Type}}`));",
                        self.named("Factory")
                    );
                });
                w.write_line("const data = decoder(val.Data);");
                w.write_block("if", "(data.is_err())", |w| {
                    w.write_line("return WuesteResult.Err(data.unwrap_err());");
                });
                wl!(w, "return this.Builder().Coerce(data.unwrap() as {coerce});");
            });
            w.blank();

            let signature = format!(
                "ToPayload(typ: {}, encoder = this._params.encoder): {result}<{payload}>",
                self.name
            );
            w.write_block("", &signature, |w| {
                wl!(w, "const data = encoder({}(typ));", self.named("ToObject"));
                w.write_block("if", "(data.is_err())", |w| {
                    w.write_line("return WuesteResult.Err(data.unwrap_err());");
                });
                w.write_block_with("return", "WuesteResult.Ok(", "{", "});", |w| {
                    wl!(w, "Type: {names}.id,");
                    w.write_line("Data: data.unwrap() as unknown as Record<string, unknown>,");
                });
            });
            w.blank();

            w.write_block("", &format!("ToObject(typ: {}): {object}", self.name), |w| {
                wl!(w, "return {}(typ);", self.named("ToObject"));
            });
            w.blank();

            w.write_block("", &format!("Clone(typ: {}): {result}<{}>", self.name, self.name), |w| {
                w.write_line("const builder = this.Builder();");
                for item in &self.schema.items {
                    let member = ts_public_name(&item.name);
                    wl!(w, "{}({});", access("builder", &member), access("typ", &member));
                }
                w.write_line("return builder.Get();");
            });
            w.blank();

            w.write_block("", &format!("Schema(): {reflection}"), |w| {
                wl!(w, "return {};", self.named("Schema"));
            });
            w.blank();

            let signature = format!(
                "Getter(typ: {}, base: {reflection}[] = []): {}",
                self.name,
                self.rt("WuestenGetterBuilder")
            );
            w.write_block("", &signature, |w| {
                wl!(w, "return {}(typ, base);", self.named("Getter"));
            });
        });
        self.w.blank();

        let registry = self.rt("WuestenTypeRegistry");
        wl!(
            self.w,
            "export const {} = {registry}.Register(new {factory_impl}({registry}.cloneAttributeBase()));",
            self.named("Factory")
        );
    }

    fn import_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (from, names) in self.imports.borrow().iter() {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            if names.len() <= 3 {
                lines.push(format!("import {{ {} }} from {};", names.join(", "), quote(from)));
                continue;
            }
            lines.push("import {".to_string());
            let last = names.len() - 1;
            for (idx, name) in names.iter().enumerate() {
                let comma = if idx == last { "" } else { "," };
                lines.push(format!("{}{name}{comma}", self.config.indent));
            }
            lines.push(format!("}} from {};", quote(from)));
        }
        lines
    }

    fn header(&self) -> Result<String> {
        let provenance = if self.config.provenance {
            provenance_lines(self.graph, self.object)
        } else {
            Vec::new()
        };
        let imports = self.import_lines();

        let tokens: js::Tokens = quote! {
            $(if !provenance.is_empty() {
                $(for line in &provenance join ($['\r']) => $(line.as_str()))
                $['\n']
            })
            $(for line in &imports join ($['\r']) => $(line.as_str()))
        };
        tokens
            .to_file_string()
            .map_err(|e| Error::Other(format!("formatting typescript header: {e}")))
    }

    fn finish(self) -> Result<String> {
        let body = self.w.to_text();
        let header = self.header()?;
        if header.trim().is_empty() {
            return Ok(format!("{}\n", body.trim_end()));
        }
        Ok(format!("{}\n\n{}\n", header.trim_end(), body.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::loader::MemoryLoader;
    use crate::property::PropertyBuilder;
    use crate::registry::Registry;
    use std::path::Path;

    const SUB: &str = r#"{"$id":"https://Sub","title":"Sub","type":"object","properties":{"Test":{"type":"string"}},"required":["Test"]}"#;

    fn render(text: &str) -> Result<GeneratedUnit> {
        let loader = MemoryLoader::new("/abs").with_file("/abs/sub.json", SUB);
        let mut registry = Registry::new(loader);
        let mut graph = SchemaGraph::new();
        let doc = Document::parse(text)?;
        let root = PropertyBuilder::new(&mut registry, &mut graph)
            .from_document(&doc, Some(Path::new("/abs/s.json")))?;
        let config = RenderConfig {
            provenance: false,
            indent: "  ".to_string(),
            from_wueste: "wueste/wueste".to_string(),
            from_result: "wueste/result".to_string(),
            ..RenderConfig::default()
        };
        let ctx = GenerateContext {
            graph: &graph,
            config: &config,
        };
        TypeScriptBackend.generate(&ctx, root)
    }

    fn nested_bool() -> String {
        let mut items = r#"{"type":"boolean"}"#.to_string();
        for _ in 0..4 {
            items = format!(r#"{{"type":"array","items":{}}}"#, items);
        }
        format!(
            r#"{{"$id":"https://N","title":"N","type":"object","properties":{{"m":{}}},"required":["m"]}}"#,
            items
        )
    }

    #[test]
    fn test_depth_four_array_coerces_once() {
        let unit = render(&nested_bool()).unwrap();
        let out = &unit.contents;
        assert_eq!(unit.file_name, "n.ts");
        assert!(out.contains("readonly m: boolean[][][][];"), "{out}");
        assert!(out.contains("function N$mCoerce(itemAttr: WuestenAttribute<boolean, WuesteCoerceTypeboolean>, c0: unknown): WuesteResult<boolean[][][][]> {"), "{out}");
        assert!(out.contains("const s0: boolean[][][][] = [];"), "{out}");
        assert!(out.contains("const s3: boolean[] = [];"), "{out}");
        assert!(out.contains("for (let i3 = t3.next(); !i3.done; i3 = t3.next()) {"), "{out}");
        assert!(out.contains("const attrRes = itemAttr.Coerce(i3.value as WuesteCoerceTypeboolean);"), "{out}");
        assert_eq!(out.matches("itemAttr.Coerce(").count(), 1, "{out}");
        assert!(out.contains("s2.push(s3);"), "{out}");
        assert!(!out.contains("i4"), "{out}");
    }

    #[test]
    fn test_members_carry_defaults_and_optionality() {
        let unit = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"a":{"type":"string"},"d":{"type":"string","default":"x"},"o":{"type":"integer"}},"required":["a","d"]}"#,
        )
        .unwrap();
        let out = &unit.contents;
        assert!(out.contains("readonly a: string;"), "{out}");
        assert!(out.contains("readonly o?: number | undefined;"), "{out}");
        assert!(out.contains("readonly d?: WuesteCoerceTypestring;"), "{out}");
        assert!(out.contains(
            r#"this._d = wuesten.AttributeString({ jsonname: "d", varname: "d", base: baseName, default: "x" });"#
        ), "{out}");
        assert!(out.contains(
            r#"this._o = wuesten.AttributeIntegerOptional({ jsonname: "o", varname: "o", base: baseName });"#
        ), "{out}");
        assert!(out.contains("errors.push(results._a.unwrap_err().message);"), "{out}");
        assert!(out.contains(r#"if (typeof v0.o !== "undefined") {"#), "{out}");
        assert!(out.contains(
            "export const SFactory = WuestenTypeRegistry.Register(new SFactoryImpl(WuestenTypeRegistry.cloneAttributeBase()));"
        ), "{out}");
    }

    #[test]
    fn test_imports_group_by_module() {
        let unit = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"sub":{"$ref":"file://sub.json"}},"required":["sub"]}"#,
        )
        .unwrap();
        let out = &unit.contents;
        assert!(out.starts_with("import {\n  Sub,\n  SubCoerceType,\n"), "{out}");
        assert!(out.contains("  SubSchema\n} from \"./sub\";\n"), "{out}");
        assert!(out.contains("import { Result as WuesteResult } from \"wueste/result\";\n"), "{out}");
        let sub = out.find("\"./sub\"").unwrap();
        let result = out.find("\"wueste/result\"").unwrap();
        let runtime = out.find("\"wueste/wueste\"").unwrap();
        assert!(sub < result && result < runtime, "{out}");
        assert!(out.contains("property: SubSchema,"), "{out}");
        assert!(out.contains("ret[\"sub\"] = SubFactory.ToObject(v0.sub);"), "{out}");
        assert_eq!(unit.discovered.len(), 1);
    }

    #[test]
    fn test_inline_objects_named_by_path() {
        let unit = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"inner":{"$id":"https://Inline","title":"Inline","type":"object","properties":{"y":{"type":"integer"}}}}}"#,
        )
        .unwrap();
        let out = &unit.contents;
        assert!(out.contains("readonly inner?: S$Inline | undefined;"), "{out}");
        assert!(out.contains("from \"./s_inline\";"), "{out}");
    }

    #[test]
    fn test_date_time_maps_to_date() {
        let unit = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"at":{"type":"string","format":"date-time"}},"required":["at"]}"#,
        )
        .unwrap();
        let out = &unit.contents;
        assert!(out.contains("readonly at: Date;"), "{out}");
        assert!(out.contains("wuesten.AttributeDateTime({"), "{out}");
        assert!(out.contains("ret[\"at\"] = v0.at.toISOString();"), "{out}");
        assert!(out.contains("format: \"date-time\","), "{out}");
    }

    #[test]
    fn test_date_format_is_unsupported() {
        let err = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"day":{"type":"string","format":"date"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
        assert!(err.to_string().contains("S.day"), "{err}");
    }

    #[test]
    fn test_builder_method_names_are_reserved() {
        let err = render(
            r#"{"$id":"https://S","title":"S","type":"object","properties":{"Get":{"type":"string"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }
}
