//! Static export scanning
//!
//! Finds the names a JavaScript file exports without executing it. Both ES
//! module syntax and the common CommonJS assignment shapes are recognised:
//!
//! - `export const a = ...`, `export function b() {}`, `export { c, d as e }`
//! - `exports.f = ...` and `module.exports.g = ...`
//! - `module.exports = { h, i: ... }`
//! - `Object.defineProperty(exports, "j", { ... })`
//!
//! Anything more dynamic is ignored, which only costs the adapter a named
//! export; the default export always carries the full module.

use crate::error::{Error, Result};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, AssignmentTarget, Declaration, Expression, ObjectPropertyKind, Program, Statement,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use rustc_hash::FxHashSet;

/// Interop marker emitted by bundlers for transpiled ES modules
const ES_MODULE_MARKER: &str = "__esModule";

/// Export names found in a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedExports {
    /// Named exports in source order, without duplicates or `default`
    pub named: Vec<String>,
    /// Whether the module has a default export
    pub has_default: bool,
}

impl ScannedExports {
    fn push(&mut self, seen: &mut FxHashSet<String>, name: &str) {
        if name == "default" {
            self.has_default = true;
            return;
        }
        if name == ES_MODULE_MARKER {
            return;
        }
        if seen.insert(name.to_string()) {
            self.named.push(name.to_string());
        }
    }
}

/// Scan `code` for its exported names.
///
/// The code is parsed as an ES module first and, failing that, as a script
/// (CommonJS bundles may use sloppy-mode syntax). Returns an error only when
/// neither parse succeeds.
pub fn scan_exports(code: &str) -> Result<ScannedExports> {
    let allocator = Allocator::default();
    let module = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if module.errors.is_empty() && !module.panicked {
        return Ok(collect(&module.program));
    }

    let script_allocator = Allocator::default();
    let script =
        Parser::new(&script_allocator, code, SourceType::mjs().with_module(false)).parse();
    if script.errors.is_empty() && !script.panicked {
        return Ok(collect(&script.program));
    }

    Err(Error::ParseFailed {
        reason: module
            .errors
            .iter()
            .map(|e| format!("{:?}", e))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Parse `code` strictly as an ES module, failing on any syntax error
pub fn validate_module(code: &str) -> Result<ScannedExports> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !parsed.errors.is_empty() || parsed.panicked {
        return Err(Error::ParseFailed {
            reason: parsed
                .errors
                .iter()
                .map(|e| format!("{:?}", e))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(collect(&parsed.program))
}

fn collect(program: &Program<'_>) -> ScannedExports {
    let mut exports = ScannedExports::default();
    let mut seen = FxHashSet::default();

    for stmt in program.body.iter() {
        match stmt {
            Statement::ExportDefaultDeclaration(_) => exports.has_default = true,
            Statement::ExportAllDeclaration(all) => {
                if let Some(exported) = &all.exported {
                    exports.push(&mut seen, exported.name().as_str());
                }
            }
            Statement::ExportNamedDeclaration(named) => {
                if let Some(decl) = &named.declaration {
                    match decl {
                        Declaration::VariableDeclaration(var) => {
                            for declarator in &var.declarations {
                                if let Some(ident) = declarator.id.get_binding_identifier() {
                                    exports.push(&mut seen, ident.name.as_str());
                                }
                            }
                        }
                        Declaration::FunctionDeclaration(func) => {
                            if let Some(id) = &func.id {
                                exports.push(&mut seen, id.name.as_str());
                            }
                        }
                        Declaration::ClassDeclaration(class) => {
                            if let Some(id) = &class.id {
                                exports.push(&mut seen, id.name.as_str());
                            }
                        }
                        _ => {}
                    }
                }
                for spec in &named.specifiers {
                    exports.push(&mut seen, spec.exported.name().as_str());
                }
            }
            Statement::ExpressionStatement(expr) => {
                collect_commonjs(&expr.expression, &mut exports, &mut seen);
            }
            _ => {}
        }
    }

    exports
}

fn collect_commonjs(
    expr: &Expression<'_>,
    exports: &mut ScannedExports,
    seen: &mut FxHashSet<String>,
) {
    match expr {
        Expression::SequenceExpression(seq) => {
            for inner in &seq.expressions {
                collect_commonjs(inner, exports, seen);
            }
        }
        Expression::AssignmentExpression(assign) => match &assign.left {
            // exports.foo = ... / module.exports.foo = ...
            AssignmentTarget::StaticMemberExpression(member) if is_exports_object(&member.object) => {
                exports.push(seen, member.property.name.as_str());
            }
            // module.exports = { ... }
            AssignmentTarget::StaticMemberExpression(member)
                if is_identifier(&member.object, "module") && member.property.name.as_str() == "exports" =>
            {
                if let Expression::ObjectExpression(object) = &assign.right {
                    for property in &object.properties {
                        if let ObjectPropertyKind::ObjectProperty(property) = property {
                            if let Some(key) = property.key.static_name() {
                                exports.push(seen, &key);
                            }
                        }
                    }
                }
            }
            _ => {}
        },
        // Object.defineProperty(exports, "foo", { ... })
        Expression::CallExpression(call) => {
            let Expression::StaticMemberExpression(callee) = &call.callee else {
                return;
            };
            if !is_identifier(&callee.object, "Object") || callee.property.name.as_str() != "defineProperty" {
                return;
            }
            let (Some(target), Some(Argument::StringLiteral(name))) =
                (call.arguments.first(), call.arguments.get(1))
            else {
                return;
            };
            if target.as_expression().is_some_and(is_exports_object) {
                exports.push(seen, name.value.as_str());
            }
        }
        _ => {}
    }
}

/// `exports` or `module.exports`
fn is_exports_object(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(ident) => ident.name.as_str() == "exports",
        Expression::StaticMemberExpression(member) => {
            is_identifier(&member.object, "module") && member.property.name.as_str() == "exports"
        }
        _ => false,
    }
}

fn is_identifier(expr: &Expression<'_>, name: &str) -> bool {
    matches!(expr, Expression::Identifier(ident) if ident.name.as_str() == name)
}
