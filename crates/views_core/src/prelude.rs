//! Pure generation of the JavaScript executed around each render.
//!
//! A render runs four scripts in order: the polyfills, the renderer bundle
//! (React + ReactDOMServer), the prelude (CommonJS loader, locals context,
//! render entry point) and the render call. Every value crossing from Rust
//! into a script is double-encoded: a JSON string literal holding JSON,
//! read back with `JSON.parse`.

use std::path::Path;

use crate::error::{CoreError, Result};

/// Pseudo-module templates require to reach the engine's exports.
pub const ENGINE_MODULE: &str = "reactviews";

/// Export of [`ENGINE_MODULE`] holding the locals context consumer.
pub const LOCALS_CONTEXT_EXPORT: &str = "LocalsContext";

/// Encode any string as a JavaScript string literal.
fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Generate the globals React and Babel expect while their bundles load.
///
/// Must run before any bundle: React's entry reads `process.env.NODE_ENV`
/// and react-dom/server builds a `TextEncoder` at load time.
pub fn generate_polyfills(node_env: &str) -> Result<String> {
    let node_env = js_string(node_env)?;

    Ok(format!(
        r#"
globalThis.process = {{
    env: {{ NODE_ENV: {node_env} }},
    cwd: () => '/',
    nextTick: (fn, ...args) => queueMicrotask(() => fn(...args)),
}};
{CONSOLE_POLYFILL}
{TIMING_POLYFILLS}
{ENCODING_POLYFILLS}
"#
    ))
}

/// Generate the render prelude: loader, locals context and entry point.
///
/// Expects the polyfills and the renderer bundle to have run.
pub fn generate_prelude() -> Result<String> {
    let engine_module = js_string(ENGINE_MODULE)?;
    let context_export = js_string(LOCALS_CONTEXT_EXPORT)?;

    Ok(format!("{VIEW_LOADER}({engine_module}, {context_export});\n"))
}

/// Generate the script that renders `entry` with the given props and locals.
pub fn generate_render_call(entry: &Path, props_json: &str, locals_json: &str) -> Result<String> {
    let entry = js_string(&entry.to_string_lossy())?;
    let props = js_string(props_json)?;
    let locals = js_string(locals_json)?;

    Ok(format!(
        "globalThis.__reactviews.render({entry}, JSON.parse({props}), JSON.parse({locals}));\n"
    ))
}

/// Generate the script that runs the transform bundle over one source file.
pub fn generate_transform_call(source: &str, options_json: &str) -> Result<String> {
    let source = js_string(source)?;
    let options = js_string(options_json)?;

    Ok(format!("{TRANSFORM_CALL}({source}, JSON.parse({options}));\n"))
}

// Each console level becomes a tracing event on the Rust side.
const CONSOLE_POLYFILL: &str = r#"
globalThis.console = (() => {
    const format = (args) => args
        .map((arg) => (arg !== null && typeof arg === 'object') ? JSON.stringify(arg) : String(arg))
        .join(' ');
    const level = (name) => (...args) => Deno.core.ops.op_console(name, format(args));
    return {
        log: level('info'),
        info: level('info'),
        warn: level('warn'),
        error: level('error'),
        debug: level('debug'),
        trace: level('trace'),
    };
})();
"#;

// React's scheduler posts work through a MessageChannel and reads
// performance.now(); static rendering only needs them to exist.
const TIMING_POLYFILLS: &str = r#"
if (typeof globalThis.performance === 'undefined') {
    const origin = Date.now();
    globalThis.performance = { timeOrigin: origin, now: () => Date.now() - origin };
}

if (typeof globalThis.MessageChannel === 'undefined') {
    globalThis.MessageChannel = class MessageChannel {
        constructor() {
            const connect = (from, to) => {
                from.onmessage = null;
                from.postMessage = (data) => queueMicrotask(() => {
                    if (typeof to.onmessage === 'function') to.onmessage({ data });
                });
                from.close = () => {};
            };
            this.port1 = {};
            this.port2 = {};
            connect(this.port1, this.port2);
            connect(this.port2, this.port1);
        }
    };
}
"#;

// UTF-8 only, which is all react-dom/server asks for.
const ENCODING_POLYFILLS: &str = r#"
if (typeof globalThis.TextEncoder === 'undefined') {
    globalThis.TextEncoder = class TextEncoder {
        get encoding() { return 'utf-8'; }
        encode(input = '') {
            const bytes = [];
            for (const char of String(input)) {
                const point = char.codePointAt(0);
                if (point < 0x80) {
                    bytes.push(point);
                } else if (point < 0x800) {
                    bytes.push(0xc0 | (point >> 6), 0x80 | (point & 0x3f));
                } else if (point < 0x10000) {
                    bytes.push(
                        0xe0 | (point >> 12),
                        0x80 | ((point >> 6) & 0x3f),
                        0x80 | (point & 0x3f),
                    );
                } else {
                    bytes.push(
                        0xf0 | (point >> 18),
                        0x80 | ((point >> 12) & 0x3f),
                        0x80 | ((point >> 6) & 0x3f),
                        0x80 | (point & 0x3f),
                    );
                }
            }
            return new Uint8Array(bytes);
        }
        encodeInto(input, destination) {
            const encoded = this.encode(input);
            const written = Math.min(encoded.length, destination.length);
            destination.set(encoded.subarray(0, written));
            return { read: String(input).length, written };
        }
    };
}

if (typeof globalThis.TextDecoder === 'undefined') {
    globalThis.TextDecoder = class TextDecoder {
        get encoding() { return 'utf-8'; }
        decode(input) {
            if (!input) return '';
            const bytes = input instanceof Uint8Array
                ? input
                : new Uint8Array(input.buffer || input);
            let output = '';
            for (let i = 0; i < bytes.length;) {
                const byte = bytes[i];
                const width = byte < 0x80 ? 1 : byte < 0xe0 ? 2 : byte < 0xf0 ? 3 : 4;
                let point = width === 1 ? byte : byte & (0xff >> (width + 1));
                for (let k = 1; k < width; k++) point = (point << 6) | (bytes[i + k] & 0x3f);
                output += String.fromCodePoint(point);
                i += width;
            }
            return output;
        }
    };
}
"#;

const VIEW_LOADER: &str = r#"
(function (engineModule, contextExport) {
    const React = globalThis.React;
    const ReactDOMServer = globalThis.ReactDOMServer;
    if (!React || !ReactDOMServer) {
        throw new Error(
            'renderer bundle must define globalThis.React and globalThis.ReactDOMServer'
        );
    }

    const LocalsContext = React.createContext();
    const builtins = {
        'react': React,
        'react-dom/server': ReactDOMServer,
        [engineModule]: { [contextExport]: LocalsContext.Consumer },
    };
    const modules = {};

    function load(parent, specifier) {
        if (Object.prototype.hasOwnProperty.call(builtins, specifier)) {
            return builtins[specifier];
        }

        const resolved = JSON.parse(Deno.core.ops.op_load_view(parent, specifier));
        const cached = modules[resolved.filename];
        if (cached) {
            return cached.exports;
        }

        const module = { exports: {}, filename: resolved.filename };
        modules[resolved.filename] = module;

        const dirname = resolved.filename.replace(/[\\/][^\\/]*$/, '');
        const factory = new Function(
            'module', 'exports', 'require', '__filename', '__dirname', resolved.code
        );
        const require = (next) => load(resolved.filename, next);
        factory(module, module.exports, require, resolved.filename, dirname);
        return module.exports;
    }

    // Transpiled ES modules export { default: Component }
    function unwrapDefault(exports) {
        return (exports && exports.default) || exports;
    }

    globalThis.__reactviews = {
        render(entry, props, locals) {
            const component = unwrapDefault(load('', entry));
            if (component === undefined || component === null) {
                throw new TypeError(entry + ' does not export a component');
            }

            const markup = ReactDOMServer.renderToStaticMarkup(
                React.createElement(
                    LocalsContext.Provider,
                    { value: locals },
                    React.createElement(component, props)
                )
            );
            Deno.core.ops.op_set_output(markup);
        },
    };
})
"#;

const TRANSFORM_CALL: &str = r#"
(function (source, options) {
    const babel = globalThis.Babel;
    if (!babel || typeof babel.transform !== 'function') {
        throw new Error('transform bundle must define globalThis.Babel.transform');
    }

    const result = babel.transform(source, options);
    if (!result || typeof result.code !== 'string') {
        throw new Error('transform produced no code for ' + options.filename);
    }
    Deno.core.ops.op_set_output(result.code);
})
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyfills_escape_node_env() {
        let result = generate_polyfills("'; alert('xss'); '").unwrap();
        assert!(result.contains(r#"NODE_ENV: "'; alert('xss'); '""#));
    }

    #[test]
    fn test_polyfills_define_bundle_globals() {
        let result = generate_polyfills("production").unwrap();
        for global in [
            "globalThis.process",
            "globalThis.console",
            "globalThis.performance",
            "globalThis.MessageChannel",
            "globalThis.TextEncoder",
            "globalThis.TextDecoder",
        ] {
            assert!(result.contains(global), "missing {global}");
        }
        assert!(result.contains("op_console"));
    }

    #[test]
    fn test_prelude_wires_engine_module_and_context() {
        let result = generate_prelude().unwrap();
        assert!(result.contains(r#"("reactviews", "LocalsContext");"#));
        assert!(result.contains("LocalsContext.Provider"));
        assert!(result.contains("op_load_view"));
        assert!(result.contains("globalThis.__reactviews"));
        assert!(!result.contains("globalThis.process"));
    }

    #[test]
    fn test_render_call_double_encodes_payloads() {
        let result = generate_render_call(
            Path::new("/app/views/home.jsx"),
            r#"{"title":"'); alert('xss'); ('"}"#,
            "null",
        )
        .unwrap();
        assert!(result.starts_with(
            r#"globalThis.__reactviews.render("/app/views/home.jsx", JSON.parse("#
        ));
        assert!(result.contains(r#"JSON.parse("{\"title\":\"'); alert('xss'); ('\"}")"#));
        assert!(result.contains(r#"JSON.parse("null")"#));
    }

    #[test]
    fn test_transform_call_embeds_source_as_string() {
        let source = "const x = <div>\"hi\"</div>;\n";
        let result = generate_transform_call(source, r#"{"filename":"/a.jsx"}"#).unwrap();
        assert!(result.contains(r#"("const x = <div>\"hi\"</div>;\n", JSON.parse("#));
        assert!(result.contains("Babel.transform"));
    }
}
