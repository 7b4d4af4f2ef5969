//! Host-side React surface evaluated into every component sandbox.
//!
//! The script evaluates to an object with `instantiate(factory)`, which hands
//! the rendering primitives to the wrapped component module, and
//! `render(component)`, which renders one static pass to markup. Hooks use
//! first-render semantics: state setters and effects are accepted and
//! ignored.

pub const RUNTIME_PRELUDE: &str = r#"
(function () {
  "use strict";

  var ELEMENT = { kind: "element" };
  var FRAGMENT = { kind: "fragment" };
  var PROVIDER = { kind: "provider" };
  var CONSUMER = { kind: "consumer" };
  var MEMO = { kind: "memo" };
  var FORWARD_REF = { kind: "forward_ref" };

  var VOID_TAGS = {
    area: true, base: true, br: true, col: true, embed: true, hr: true, img: true,
    input: true, link: true, meta: true, source: true, track: true, wbr: true
  };
  var UNITLESS = {
    animationIterationCount: true, aspectRatio: true, columnCount: true, flex: true,
    flexGrow: true, flexShrink: true, fontWeight: true, gridColumn: true, gridRow: true,
    lineHeight: true, opacity: true, order: true, orphans: true, tabSize: true,
    widows: true, zIndex: true, zoom: true, fillOpacity: true, strokeOpacity: true
  };
  var ATTRIBUTE_NAMES = {
    className: "class", htmlFor: "for", tabIndex: "tabindex", readOnly: "readonly",
    maxLength: "maxlength", colSpan: "colspan", rowSpan: "rowspan",
    autoFocus: "autofocus", autoComplete: "autocomplete", defaultValue: "value",
    defaultChecked: "checked", srcSet: "srcset", crossOrigin: "crossorigin"
  };
  var SKIPPED_PROPS = {
    children: true, key: true, ref: true, dangerouslySetInnerHTML: true,
    suppressHydrationWarning: true, suppressContentEditableWarning: true
  };

  var hasOwn = function (object, name) {
    return Object.prototype.hasOwnProperty.call(object, name);
  };
  var noop = function () {};
  var idCounter = 0;

  function createElement(type, config) {
    var props = {};
    var key = null;
    if (config !== null && config !== undefined) {
      for (var name in config) {
        if (!hasOwn(config, name)) continue;
        if (name === "key") {
          key = config.key === undefined ? null : String(config.key);
          continue;
        }
        props[name] = config[name];
      }
    }
    var count = arguments.length - 2;
    if (count === 1) {
      props.children = arguments[2];
    } else if (count > 1) {
      props.children = Array.prototype.slice.call(arguments, 2);
    }
    if (type && type.defaultProps) {
      for (var prop in type.defaultProps) {
        if (props[prop] === undefined) props[prop] = type.defaultProps[prop];
      }
    }
    return { $$typeof: ELEMENT, type: type, key: key, props: props };
  }

  function isValidElement(value) {
    return typeof value === "object" && value !== null && value.$$typeof === ELEMENT;
  }

  function cloneElement(element, config) {
    var merged = {};
    for (var name in element.props) merged[name] = element.props[name];
    if (config) {
      for (var extra in config) merged[extra] = config[extra];
    }
    var args = [element.type, merged];
    for (var i = 2; i < arguments.length; i++) args.push(arguments[i]);
    return createElement.apply(null, args);
  }

  function flattenChildren(children, out) {
    if (Array.isArray(children)) {
      for (var i = 0; i < children.length; i++) flattenChildren(children[i], out);
    } else if (children !== null && children !== undefined && typeof children !== "boolean") {
      out.push(children);
    }
    return out;
  }

  var Children = {
    toArray: function (children) { return flattenChildren(children, []); },
    count: function (children) { return flattenChildren(children, []).length; },
    map: function (children, fn) {
      return flattenChildren(children, []).map(function (child, index) { return fn(child, index); });
    },
    forEach: function (children, fn) {
      flattenChildren(children, []).forEach(function (child, index) { fn(child, index); });
    },
    only: function (children) {
      var all = flattenChildren(children, []);
      if (all.length !== 1) throw new Error("React.Children.only expected to receive a single React element child.");
      return all[0];
    }
  };

  function createContext(defaultValue) {
    var context = { currentValue: defaultValue };
    context.Provider = { $$typeof: PROVIDER, context: context };
    context.Consumer = { $$typeof: CONSUMER, context: context };
    return context;
  }

  function Component(props, context) {
    this.props = props;
    this.context = context;
    this.state = null;
  }
  Component.prototype.isReactComponent = {};
  Component.prototype.setState = noop;
  Component.prototype.forceUpdate = noop;

  function PureComponent(props, context) {
    Component.call(this, props, context);
  }
  PureComponent.prototype = Object.create(Component.prototype);
  PureComponent.prototype.constructor = PureComponent;

  function useState(initial) {
    return [typeof initial === "function" ? initial() : initial, noop];
  }
  function useReducer(reducer, initialArg, init) {
    return [typeof init === "function" ? init(initialArg) : initialArg, noop];
  }
  function useRef(initial) { return { current: initial === undefined ? null : initial }; }
  function useMemo(factory) { return factory(); }
  function useCallback(callback) { return callback; }
  function useContext(context) { return context.currentValue; }
  function useId() { idCounter += 1; return ":r" + idCounter.toString(36) + ":"; }

  var React = {
    createElement: createElement,
    cloneElement: cloneElement,
    isValidElement: isValidElement,
    createContext: createContext,
    Children: Children,
    Component: Component,
    PureComponent: PureComponent,
    Fragment: FRAGMENT,
    StrictMode: FRAGMENT,
    memo: function (type) { return { $$typeof: MEMO, type: type }; },
    forwardRef: function (render) { return { $$typeof: FORWARD_REF, render: render }; },
    useState: useState,
    useEffect: noop,
    useLayoutEffect: noop,
    useInsertionEffect: noop,
    useRef: useRef,
    useMemo: useMemo,
    useCallback: useCallback,
    useContext: useContext,
    useReducer: useReducer,
    useId: useId,
    useImperativeHandle: noop,
    useDebugValue: noop
  };

  function escapeText(text) {
    return String(text).replace(/&/g, "&amp;").replace(/</g, "&lt;").replace(/>/g, "&gt;");
  }
  function escapeAttribute(text) {
    return escapeText(text).replace(/"/g, "&quot;");
  }

  function hyphenate(name) {
    if (name.indexOf("--") === 0) return name;
    var out = name.replace(/[A-Z]/g, function (letter) { return "-" + letter.toLowerCase(); });
    return out.indexOf("ms-") === 0 ? "-" + out : out;
  }

  function styleToCss(style) {
    if (typeof style !== "object" || style === null) return "";
    var parts = [];
    for (var key in style) {
      if (!hasOwn(style, key)) continue;
      var value = style[key];
      if (value === null || value === undefined || typeof value === "boolean" || value === "") continue;
      if (typeof value === "number" && value !== 0 && !UNITLESS[key] && key.indexOf("--") !== 0) {
        value = value + "px";
      }
      parts.push(hyphenate(key) + ":" + String(value).trim());
    }
    return parts.join(";");
  }

  function describe(value) {
    if (value === null) return "null";
    if (Array.isArray(value)) return "array";
    if (typeof value === "object") return "object with keys {" + Object.keys(value).join(", ") + "}";
    return typeof value;
  }

  function renderNode(node) {
    if (node === null || node === undefined || typeof node === "boolean") return "";
    if (typeof node === "string") return escapeText(node);
    if (typeof node === "number" || typeof node === "bigint") return escapeText(String(node));
    if (Array.isArray(node)) {
      var out = "";
      for (var i = 0; i < node.length; i++) out += renderNode(node[i]);
      return out;
    }
    if (isValidElement(node)) return renderElement(node);
    if (typeof node === "function") return "";
    throw new Error("Objects are not valid as a React child (found: " + describe(node) + ").");
  }

  function renderElement(element) {
    var type = element.type;
    var props = element.props;

    if (typeof type === "string") return renderHost(type, props);
    if (type === FRAGMENT) return renderNode(props.children);
    if (typeof type === "function") {
      if (type.prototype && type.prototype.isReactComponent) {
        var instance = new type(props);
        instance.props = props;
        if (typeof type.getDerivedStateFromProps === "function") {
          var derived = type.getDerivedStateFromProps(props, instance.state);
          if (derived) instance.state = Object.assign({}, instance.state, derived);
        }
        return renderNode(instance.render());
      }
      return renderNode(type(props));
    }
    if (type && type.$$typeof === PROVIDER) {
      var previous = type.context.currentValue;
      type.context.currentValue = props.value;
      try {
        return renderNode(props.children);
      } finally {
        type.context.currentValue = previous;
      }
    }
    if (type && type.$$typeof === CONSUMER) {
      return typeof props.children === "function"
        ? renderNode(props.children(type.context.currentValue))
        : "";
    }
    if (type && type.$$typeof === MEMO) {
      return renderElement({ $$typeof: ELEMENT, type: type.type, key: element.key, props: props });
    }
    if (type && type.$$typeof === FORWARD_REF) {
      return renderNode(type.render(props, null));
    }
    throw new Error(
      "Element type is invalid: expected a string or a class/function but got: " + describe(type) + "."
    );
  }

  function renderHost(tag, props) {
    var html = "<" + tag;
    for (var name in props) {
      if (!hasOwn(props, name) || SKIPPED_PROPS[name]) continue;
      var value = props[name];
      if (value === null || value === undefined || value === false || typeof value === "function") continue;
      if (/^on[A-Z]/.test(name)) continue;
      if (name === "style") {
        var css = styleToCss(value);
        if (css) html += " style=\"" + escapeAttribute(css) + "\"";
        continue;
      }
      var attribute = ATTRIBUTE_NAMES[name] || name;
      if (value === true) {
        html += /^(data|aria)-/.test(attribute) ? " " + attribute + "=\"true\"" : " " + attribute;
        continue;
      }
      html += " " + attribute + "=\"" + escapeAttribute(value) + "\"";
    }
    if (VOID_TAGS[tag]) return html + ">";
    html += ">";
    var inner = props.dangerouslySetInnerHTML;
    if (inner && inner.__html !== undefined && inner.__html !== null) {
      html += String(inner.__html);
    } else {
      html += renderNode(props.children);
    }
    return html + "</" + tag + ">";
  }

  return {
    instantiate: function (factory) {
      return factory(
        React, useState, noop, useRef, useMemo, useCallback, useContext, useReducer,
        undefined, undefined, undefined, undefined
      );
    },
    render: function (component) {
      idCounter = 0;
      return renderNode(createElement(component, null));
    }
  };
})()
"#;

/// Parameters of the wrapper function around a component module. The last
/// four shadow host globals.
pub const FACTORY_PARAMETERS: &str = "React, useState, useEffect, useRef, useMemo, useCallback, \
     useContext, useReducer, globalThis, window, document, self";
