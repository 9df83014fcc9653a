//! Go backend
//!
//! Nominal structs with json tags. Every object schema becomes one file
//! holding the class interface, param and json structs, the immutable
//! implementation, a validating builder and a map-based factory. The
//! implementation also gets `Clone`, `Less`, `Hash` and `AsMap`.

use super::arrays::member_object;
use super::{
    check_member_names, provenance_lines, source_name, Backend, GenerateContext, GeneratedUnit,
    Language, RenderConfig,
};
use crate::error::{Error, Result};
use crate::property::{NodeId, Property, PropertyItem, PropertyKind, PropertyObject, SchemaGraph};
use crate::util::{file_stem, go_private_name, go_public_name, quote};
use crate::wl;
use crate::writer::BlockWriter;
use genco::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;

pub const WUESTE_IMPORT: &str = "github.com/mabels/wueste/entity-generator/wueste";
pub const RUSTY_IMPORT: &str = "github.com/mabels/wueste/entity-generator/rusty";

#[derive(Debug, Clone, Copy, Default)]
pub struct GoBackend;

impl Backend for GoBackend {
    fn language(&self) -> Language {
        Language::Go
    }

    fn file_name(&self, graph: &SchemaGraph, object: NodeId) -> String {
        let title = graph.object(object).map(|o| o.title()).unwrap_or_default();
        format!("{}.go", file_stem(title))
    }

    fn generate(&mut self, ctx: &GenerateContext<'_>, object: NodeId) -> Result<GeneratedUnit> {
        let schema = ctx.graph.object(object).ok_or_else(|| {
            Error::UnsupportedShape(format!("{} is a {}, not an object", object, ctx.graph.kind(object)))
        })?;
        validate(ctx.graph, schema)?;

        let unit = GoUnit::new(ctx.graph, ctx.config, schema);
        unit.emit();
        let contents = unit.finish(object)?;
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

/// Reject shapes the emitted comparison and hash code cannot express
fn validate(graph: &SchemaGraph, schema: &PropertyObject) -> Result<()> {
    if schema.title().is_empty() {
        return Err(Error::UnsupportedShape(format!(
            "object {:?} needs a title to name go types",
            schema.id()
        )));
    }
    check_member_names(schema, go_public_name)?;
    for item in &schema.items {
        let leaf = graph.array_leaf(item.property);
        if let Some(object) = graph.object(leaf) {
            if !object.has_members() {
                return Err(Error::UnsupportedShape(format!(
                    "{}.{}: object without properties",
                    schema.title(),
                    item.name
                )));
            }
            if object.title().is_empty() {
                return Err(Error::UnsupportedShape(format!(
                    "{}.{}: object {:?} needs a title",
                    schema.title(),
                    item.name,
                    object.id()
                )));
            }
        }
    }
    Ok(())
}

fn type_name(title: &str, suffix: &str) -> String {
    go_public_name(&format!("{title}{suffix}"))
}

fn json_tag(item: &PropertyItem) -> String {
    if item.optional {
        format!("`json:{}`", quote(&format!("{},omitempty", item.name)))
    } else {
        format!("`json:{}`", quote(&item.name))
    }
}

struct GoUnit<'a> {
    graph: &'a SchemaGraph,
    config: &'a RenderConfig,
    schema: &'a PropertyObject,
    imports: RefCell<BTreeSet<&'static str>>,
    w: BlockWriter,
}

impl<'a> GoUnit<'a> {
    fn new(graph: &'a SchemaGraph, config: &'a RenderConfig, schema: &'a PropertyObject) -> Self {
        Self {
            graph,
            config,
            schema,
            imports: RefCell::new(BTreeSet::new()),
            w: BlockWriter::new(config.indent.clone()),
        }
    }

    fn use_import(&self, path: &'static str) {
        self.imports.borrow_mut().insert(path);
    }

    fn title(&self) -> &str {
        self.schema.title()
    }

    fn class_name(&self) -> String {
        type_name(self.title(), "Class")
    }

    fn builder_name(&self) -> String {
        type_name(self.title(), "Builder")
    }

    fn factory_name(&self) -> String {
        type_name(self.title(), "Factory")
    }

    fn impl_name(&self) -> String {
        go_private_name(&format!("{}Impl", self.title()))
    }

    fn go_type(&self, id: NodeId) -> String {
        match self.graph.property(id) {
            Property::String(_) => "string".to_string(),
            Property::Integer(_) => "int64".to_string(),
            Property::Number(_) => "float64".to_string(),
            Property::Boolean(_) => "bool".to_string(),
            Property::Array(a) => format!("[]{}", self.go_type(a.items)),
            Property::Object(o) if o.has_members() => type_name(o.title(), "Class"),
            Property::Object(_) => "map[string]interface{}".to_string(),
        }
    }

    fn json_type(&self, id: NodeId) -> String {
        match self.graph.property(id) {
            Property::Array(a) => format!("[]{}", self.json_type(a.items)),
            Property::Object(o) if o.has_members() => type_name(o.title(), "Json"),
            _ => self.go_type(id),
        }
    }

    fn value_type(&self, item: &PropertyItem) -> String {
        let typ = self.go_type(item.property);
        if item.optional {
            self.use_import(RUSTY_IMPORT);
            format!("rusty.Optional[{typ}]")
        } else {
            typ
        }
    }

    fn emit(&self) {
        self.emit_class();
        self.emit_param();
        self.emit_json();
        self.emit_impl();
        self.emit_builder();
        self.emit_clone();
        self.emit_less();
        self.emit_hash();
        self.emit_as_map();
        self.emit_factory();
    }

    fn emit_class(&self) {
        let class = self.class_name();
        self.use_import("io");
        self.w.write_block("type", &format!("{class} interface"), |w| {
            for item in &self.schema.items {
                wl!(w, "{}() {}", go_public_name(&item.name), self.value_type(item));
            }
            wl!(w, "Clone() {class}");
            wl!(w, "Less(other {class}) bool");
            w.write_line("Hash(w io.Writer)");
            w.write_line("AsMap() map[string]interface{}");
        });
        self.w.blank();
    }

    fn emit_param(&self) {
        let name = type_name(self.title(), "Param");
        self.w.write_block("type", &format!("{name} struct"), |w| {
            for item in &self.schema.items {
                wl!(w, "{} {}", go_public_name(&item.name), self.value_type(item));
            }
        });
        self.w.blank();
    }

    fn emit_json(&self) {
        let name = type_name(self.title(), "Json");
        self.w.write_block("type", &format!("{name} struct"), |w| {
            for item in &self.schema.items {
                let ptr = if item.optional { "*" } else { "" };
                wl!(
                    w,
                    "{} {}{} {}",
                    go_public_name(&item.name),
                    ptr,
                    self.json_type(item.property),
                    json_tag(item)
                );
            }
        });
        self.w.blank();
    }

    fn emit_impl(&self) {
        let impl_name = self.impl_name();
        self.w.write_block("type", &format!("{impl_name} struct"), |w| {
            for item in &self.schema.items {
                wl!(w, "{} {}", go_private_name(&item.name), self.value_type(item));
            }
        });
        self.w.blank();
        for item in &self.schema.items {
            let signature = format!(
                "(my *{impl_name}) {}() {}",
                go_public_name(&item.name),
                self.value_type(item)
            );
            self.w.write_block("func", &signature, |w| {
                wl!(w, "return my.{}", go_private_name(&item.name));
            });
            self.w.blank();
        }
    }

    /// Builder attribute initializer and the value `NewXBuilder` seeds it with
    ///
    /// `OptionalAttribute` stays invalid until `Set`; `MustAttribute` starts
    /// out set to the zero value, which is `None` for `rusty.Optional`.
    fn attribute_init(&self, item: &PropertyItem) -> (String, Option<String>) {
        self.use_import(WUESTE_IMPORT);
        let typ = self.go_type(item.property);
        let default = self.graph.property(item.property).default_json();
        match (item.optional, default) {
            (false, default) => (format!("wueste.OptionalAttribute[{typ}]()"), default),
            (true, None) => (format!("wueste.MustAttribute[rusty.Optional[{typ}]]()"), None),
            (true, Some(value)) => (
                format!("wueste.OptionalAttribute[rusty.Optional[{typ}]]()"),
                Some(format!("rusty.Some[{typ}]({value})")),
            ),
        }
    }

    fn emit_builder(&self) {
        let builder = self.builder_name();
        let class = self.class_name();
        self.use_import(RUSTY_IMPORT);

        self.w.write_block("type", &format!("{builder} struct"), |w| {
            for item in &self.schema.items {
                self.use_import(WUESTE_IMPORT);
                wl!(
                    w,
                    "{} wueste.Attribute[{}]",
                    go_private_name(&item.name),
                    self.value_type(item)
                );
            }
        });
        self.w.blank();

        self.w.write_block("func", &format!("New{builder}() *{builder}"), |w| {
            let mut seeds = Vec::new();
            w.write_block_with("b :=", &format!("&{builder}"), "{", "}", |w| {
                for item in &self.schema.items {
                    let field = go_private_name(&item.name);
                    let (init, seed) = self.attribute_init(item);
                    wl!(w, "{field}: {init},");
                    if let Some(seed) = seed {
                        seeds.push(format!("b.{field}.Set({seed})"));
                    }
                }
            });
            w.write_lines(seeds);
            w.write_line("return b");
        });
        self.w.blank();

        for item in &self.schema.items {
            let signature = format!(
                "(b *{builder}) {}(v {}) *{builder}",
                go_public_name(&item.name),
                self.value_type(item)
            );
            self.w.write_block("func", &signature, |w| {
                wl!(w, "b.{}.Set(v)", go_private_name(&item.name));
                w.write_line("return b");
            });
            self.w.blank();
        }

        self.w
            .write_block("func", &format!("(b *{builder}) IsValid() rusty.Optional[error]"), |w| {
                let needed = self
                    .schema
                    .items
                    .iter()
                    .filter(|i| !i.optional && !self.graph.property(i.property).has_default());
                for item in needed {
                    self.use_import("fmt");
                    let condition = format!(
                        "valid := b.{}.IsValid(); valid.IsSome()",
                        go_private_name(&item.name)
                    );
                    w.write_if(&condition, |w| {
                        let message = quote(&format!("{}.{}: %s", self.title(), item.name));
                        wl!(
                            w,
                            "return rusty.Some[error](fmt.Errorf({message}, (*valid.Value()).Error()))"
                        );
                    });
                }
                w.write_line("return rusty.None[error]()");
            });
        self.w.blank();

        self.w
            .write_block("func", &format!("(b *{builder}) ToClass() rusty.Result[{class}]"), |w| {
                w.write_if("valid := b.IsValid(); valid.IsSome()", |w| {
                    wl!(w, "return rusty.Err[{class}](*valid.Value())");
                });
                w.write_block_with(
                    "return",
                    &format!("rusty.Ok[{class}](&{}", self.impl_name()),
                    "{",
                    "})",
                    |w| {
                        for item in &self.schema.items {
                            let field = go_private_name(&item.name);
                            wl!(w, "{field}: b.{field}.Get(),");
                        }
                    },
                );
            });
        self.w.blank();
    }

    fn emit_clone(&self) {
        let impl_name = self.impl_name();
        let class = self.class_name();
        self.w
            .write_block("func", &format!("(my *{impl_name}) Clone() {class}"), |w| {
                w.write_block_with("return", &format!("&{impl_name}"), "{", "}", |w| {
                    for item in &self.schema.items {
                        let field = go_private_name(&item.name);
                        wl!(w, "{field}: my.{field},");
                    }
                });
            });
        self.w.blank();
    }

    fn emit_less(&self) {
        let impl_name = self.impl_name();
        let class = self.class_name();
        self.w
            .write_block("func", &format!("(my *{impl_name}) Less(other {class}) bool"), |w| {
                for item in &self.schema.items {
                    self.less_member(w, item);
                }
                w.write_line("return false");
            });
        self.w.blank();
    }

    fn less_member(&self, w: &BlockWriter, item: &PropertyItem) {
        let my = format!("my.{}", go_private_name(&item.name));
        let other = format!("other.{}()", go_public_name(&item.name));
        if !item.optional {
            self.less_value(w, item.property, &my, &other, 0);
            return;
        }
        wl!(w, "if {my}.IsSome() && {other}.IsSome() {{");
        let inner = w.indent();
        wl!(inner, "a := *{my}.Value()");
        wl!(inner, "b := *{other}.Value()");
        self.less_value(&inner, item.property, "a", "b", 0);
        wl!(w, "}} else if {my}.IsSome() && {other}.IsNone() {{");
        w.indent().write_line("return true");
        wl!(w, "}} else if {my}.IsNone() && {other}.IsSome() {{");
        w.indent().write_line("return false");
        w.write_line("}");
    }

    fn less_value(&self, w: &BlockWriter, id: NodeId, my: &str, other: &str, level: usize) {
        let (less, greater) = match self.graph.property(id) {
            Property::String(_) => {
                self.use_import("strings");
                (
                    format!("strings.Compare({my}, {other}) < 0"),
                    format!("strings.Compare({my}, {other}) > 0"),
                )
            }
            Property::Integer(_) | Property::Number(_) => {
                (format!("{my} < {other}"), format!("{my} > {other}"))
            }
            Property::Boolean(_) => (format!("!{my} && {other}"), format!("{my} && !{other}")),
            Property::Object(_) => (format!("{my}.Less({other})"), format!("{other}.Less({my})")),
            Property::Array(a) => {
                w.write_if(&format!("len({my}) < len({other})"), |w| w.write_line("return true"));
                w.write_if(&format!("len({my}) > len({other})"), |w| w.write_line("return false"));
                let i = format!("i{level}");
                w.write_block("for", &format!("{i} := 0; {i} < len({my}); {i}++"), |w| {
                    self.less_value(
                        w,
                        a.items,
                        &format!("{my}[{i}]"),
                        &format!("{other}[{i}]"),
                        level + 1,
                    );
                });
                return;
            }
        };
        w.write_if(&less, |w| w.write_line("return true"));
        w.write_if(&greater, |w| w.write_line("return false"));
    }

    fn emit_hash(&self) {
        let impl_name = self.impl_name();
        self.w
            .write_block("func", &format!("(my *{impl_name}) Hash(w io.Writer)"), |w| {
                for item in &self.schema.items {
                    let field = format!("my.{}", go_private_name(&item.name));
                    wl!(w, "w.Write([]byte({}))", quote(&format!("{}:", quote(&item.name))));
                    if item.optional {
                        w.write_if_else(
                            &format!("{field}.IsSome()"),
                            |w| {
                                wl!(w, "h := *{field}.Value()");
                                self.hash_value(w, item.property, "h", 0);
                            },
                            |w| w.write_line("w.Write([]byte(\"-\"))"),
                        );
                    } else {
                        self.hash_value(w, item.property, &field, 0);
                    }
                    w.write_line("w.Write([]byte(\",\"))");
                }
            });
        self.w.blank();
    }

    fn hash_value(&self, w: &BlockWriter, id: NodeId, v: &str, level: usize) {
        let literal = match self.graph.property(id) {
            Property::String(_) => "StringLiteral",
            Property::Integer(_) => "IntegerLiteral",
            Property::Boolean(_) => "BoolLiteral",
            Property::Number(_) => {
                self.use_import("strconv");
                wl!(w, "w.Write([]byte(strconv.FormatFloat({v}, 'g', -1, 64)))");
                return;
            }
            Property::Object(_) => {
                wl!(w, "{v}.Hash(w)");
                return;
            }
            Property::Array(a) => {
                w.write_line("w.Write([]byte(\"[\"))");
                let i = format!("i{level}");
                w.write_block("for", &format!("{i} := 0; {i} < len({v}); {i}++"), |w| {
                    w.write_if(&format!("{i} > 0"), |w| w.write_line("w.Write([]byte(\",\"))"));
                    self.hash_value(w, a.items, &format!("{v}[{i}]"), level + 1);
                });
                w.write_line("w.Write([]byte(\"]\"))");
                return;
            }
        };
        self.use_import(WUESTE_IMPORT);
        wl!(w, "w.Write([]byte(*wueste.{literal}({v}).String()))");
    }

    fn emit_as_map(&self) {
        let impl_name = self.impl_name();
        self.w.write_block(
            "func",
            &format!("(my *{impl_name}) AsMap() map[string]interface{{}}"),
            |w| {
                w.write_line("res := map[string]interface{}{}");
                for item in &self.schema.items {
                    let field = format!("my.{}", go_private_name(&item.name));
                    let key = quote(&item.name);
                    if item.optional {
                        w.write_if(&format!("{field}.IsSome()"), |w| {
                            wl!(w, "v := *{field}.Value()");
                            let value = self.map_value(w, item.property, "v", 0);
                            wl!(w, "res[{key}] = {value}");
                        });
                    } else if self.graph.kind(item.property) == PropertyKind::Array
                        && member_object(self.graph, item.property).is_some()
                    {
                        w.write_block_with("", "", "{", "}", |w| {
                            let value = self.map_value(w, item.property, &field, 0);
                            wl!(w, "res[{key}] = {value}");
                        });
                    } else {
                        let value = self.map_value(w, item.property, &field, 0);
                        wl!(w, "res[{key}] = {value}");
                    }
                }
                w.write_line("return res");
            },
        );
        self.w.blank();
    }

    /// Expression for `v` in map form; arrays of objects are converted first
    fn map_value(&self, w: &BlockWriter, id: NodeId, v: &str, level: usize) -> String {
        match self.graph.property(id) {
            Property::Object(o) if o.has_members() => format!("{v}.AsMap()"),
            Property::Array(a) if member_object(self.graph, id).is_some() => {
                let m = format!("m{level}");
                let i = format!("i{level}");
                wl!(w, "{m} := make([]interface{{}}, 0, len({v}))");
                w.write_block("for", &format!("{i} := 0; {i} < len({v}); {i}++"), |w| {
                    let element = self.map_value(w, a.items, &format!("{v}[{i}]"), level + 1);
                    wl!(w, "{m} = append({m}, {element})");
                });
                m
            }
            _ => v.to_string(),
        }
    }

    fn emit_factory(&self) {
        let factory = self.factory_name();
        let builder = self.builder_name();
        let class = self.class_name();

        self.w.write_block("type", &format!("{factory} struct"), |_| {});
        self.w.blank();
        self.w.write_block("func", &format!("New{factory}() *{factory}"), |w| {
            wl!(w, "return &{factory}{{}}");
        });
        self.w.blank();
        self.w
            .write_block("func", &format!("(f *{factory}) Builder() *{builder}"), |w| {
                wl!(w, "return New{builder}()");
            });
        self.w.blank();

        let signature =
            format!("(f *{factory}) FromMap(m map[string]interface{{}}) rusty.Result[{class}]");
        self.w.write_block("func", &signature, |w| {
            w.write_line("b := f.Builder()");
            for item in &self.schema.items {
                let condition = format!("val, found := m[{}]; found", quote(&item.name));
                w.write_if(&condition, |w| {
                    let path = format!("{}.{}", self.title(), item.name);
                    let value = self.coerce_value(w, item.property, "val", &path, 0);
                    let setter = go_public_name(&item.name);
                    if item.optional {
                        let typ = self.go_type(item.property);
                        wl!(w, "b.{setter}(rusty.Some[{typ}]({value}))");
                    } else {
                        wl!(w, "b.{setter}({value})");
                    }
                });
            }
            w.write_line("return b.ToClass()");
        });
        self.w.blank();
    }

    fn type_error(&self, w: &BlockWriter, src: &str, path: &str, expected: &str) {
        self.use_import("fmt");
        let message = quote(&format!("{path}: expected {expected}, got %T"));
        wl!(w, "return rusty.Err[{}](fmt.Errorf({message}, {src}))", self.class_name());
    }

    fn number_switch(&self, w: &BlockWriter, target: &str, src: &str, path: &str, cases: [(&str, &str); 3], expected: &str) {
        wl!(w, "switch x := {src}.(type) {{");
        for (case, conversion) in cases {
            wl!(w, "case {case}:");
            wl!(w.indent(), "{target} = {conversion}");
        }
        w.write_line("default:");
        self.type_error(&w.indent(), src, path, expected);
        w.write_line("}");
    }

    /// Emit the checks turning `src` into a typed value; returns the variable
    fn coerce_value(&self, w: &BlockWriter, id: NodeId, src: &str, path: &str, level: usize) -> String {
        let c = format!("c{level}");
        match self.graph.property(id) {
            Property::String(_) | Property::Boolean(_) => {
                let typ = self.go_type(id);
                wl!(w, "{c}, ok := {src}.({typ})");
                w.write_if("!ok", |w| self.type_error(w, src, path, &typ));
                c
            }
            Property::Integer(_) => {
                wl!(w, "var {c} int64");
                self.number_switch(
                    w,
                    &c,
                    src,
                    path,
                    [("int64", "x"), ("int", "int64(x)"), ("float64", "int64(x)")],
                    "integer",
                );
                c
            }
            Property::Number(_) => {
                wl!(w, "var {c} float64");
                self.number_switch(
                    w,
                    &c,
                    src,
                    path,
                    [("float64", "x"), ("int64", "float64(x)"), ("int", "float64(x)")],
                    "number",
                );
                c
            }
            Property::Object(o) => {
                let m = format!("m{level}");
                let r = format!("o{level}");
                wl!(w, "{m}, ok := {src}.(map[string]interface{{}})");
                w.write_if("!ok", |w| self.type_error(w, src, path, "object"));
                wl!(w, "{r} := New{}().FromMap({m})", type_name(o.title(), "Factory"));
                w.write_if(&format!("{r}.IsErr()"), |w| {
                    wl!(w, "return rusty.Err[{}]({r}.Err())", self.class_name());
                });
                format!("{r}.Ok()")
            }
            Property::Array(a) => {
                let r = format!("r{level}");
                let s = format!("s{level}");
                let i = format!("i{level}");
                wl!(w, "{r}, ok := {src}.([]interface{{}})");
                w.write_if("!ok", |w| self.type_error(w, src, path, "array"));
                wl!(w, "{s} := make({}, 0, len({r}))", self.go_type(id));
                w.write_block("for", &format!("{i} := 0; {i} < len({r}); {i}++"), |w| {
                    let element = self.coerce_value(w, a.items, &format!("{r}[{i}]"), path, level + 1);
                    wl!(w, "{s} = append({s}, {element})");
                });
                s
            }
        }
    }

    fn header(&self, object: NodeId) -> Result<String> {
        let provenance = if self.config.provenance {
            provenance_lines(self.graph, object)
        } else {
            Vec::new()
        };
        let imports: Vec<String> = self
            .imports
            .borrow()
            .iter()
            .map(|path| format!("{}{}", self.config.indent, quote(path)))
            .collect();

        let tokens: go::Tokens = quote! {
            $(if !provenance.is_empty() {
                $(for line in &provenance join ($['\r']) => $(line.as_str()))
                $['\n']
            })
            package $(&self.config.package_name)
            $(if !imports.is_empty() {
                $['\n']
                $("import (")
                $(for line in &imports join ($['\r']) => $(line.as_str()))
                $(")")
            })
        };
        tokens
            .to_file_string()
            .map_err(|e| Error::Other(format!("formatting go header: {e}")))
    }

    fn finish(self, object: NodeId) -> Result<String> {
        let body = self.w.to_text();
        let header = self.header(object)?;
        Ok(format!("{}\n\n{}\n", header.trim_end(), body.trim_end()))
    }
}
