//! The XML source format.
//!
//! A program arrives as a `<program language="IPPcode23">` document whose
//! children are `<instruction order=".." opcode="..">` elements carrying
//! `<arg1>`..`<arg3>` operands. This module checks the document against
//! that shape (exit 31 for XML that does not parse at all, exit 32 for a
//! well-formed document that is not a valid program) and produces the
//! sorted [`Program`] image the execution engine consumes.
//!
//! `order` is a sort key only: it must be positive and unique, but gaps
//! are fine.

use std::collections::HashSet;

use xmltree::{Element, XMLNode};

use crate::error::{Error, Result};
use crate::operand::Operand;
use crate::program::{Instruction, Opcode, Program, Slot};

/// Parse a source document into a program image.
pub fn parse_program(source: &str) -> Result<Program> {
    let root = Element::parse(source.as_bytes()).map_err(|err| Error::Document(err.to_string()))?;

    if root.name != "program" {
        return Err(Error::Program(format!(
            "unexpected root element '{}'",
            root.name
        )));
    }
    match root.attributes.get("language") {
        Some(language) if language.eq_ignore_ascii_case("IPPcode23") => {}
        Some(language) => {
            return Err(Error::Program(format!("unsupported language '{language}'")));
        }
        None => return Err(Error::Program("missing 'language' attribute".to_string())),
    }

    let mut instructions = Vec::new();
    let mut orders = HashSet::new();
    for node in &root.children {
        if let Some(element) = significant(node, "program")? {
            instructions.push(parse_instruction(element, &mut orders)?);
        }
    }
    instructions.sort_by_key(|instruction| instruction.order);

    Ok(Program { instructions })
}

fn parse_instruction(element: &Element, orders: &mut HashSet<u32>) -> Result<Instruction> {
    if element.name != "instruction" {
        return Err(Error::Program(format!(
            "unexpected element '{}'",
            element.name
        )));
    }

    let order = element
        .attributes
        .get("order")
        .ok_or_else(|| Error::Program("instruction without an 'order' attribute".to_string()))?;
    let order: u32 = order
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Program(format!("invalid order '{order}'")))?;
    if !orders.insert(order) {
        return Err(Error::Program(format!("duplicate order {order}")));
    }

    let opcode: Opcode = element
        .attributes
        .get("opcode")
        .ok_or_else(|| Error::Program("instruction without an 'opcode' attribute".to_string()))?
        .parse()?;

    // Argument elements may appear in any document order; they are keyed
    // by name and must form a gap-free arg1..argN prefix.
    let mut slots: [Option<&Element>; 3] = [None; 3];
    for node in &element.children {
        let Some(arg) = significant(node, "instruction")? else {
            continue;
        };
        let position = match arg.name.as_str() {
            "arg1" => 0,
            "arg2" => 1,
            "arg3" => 2,
            other => {
                return Err(Error::Program(format!(
                    "unexpected element '{other}' in order {order}"
                )));
            }
        };
        if slots[position].replace(arg).is_some() {
            return Err(Error::Program(format!(
                "duplicate {} in order {order}",
                arg.name
            )));
        }
    }

    let present = slots.iter().take_while(|slot| slot.is_some()).count();
    if slots.iter().skip(present).any(|slot| slot.is_some()) {
        return Err(Error::Program(format!(
            "non-contiguous arguments in order {order}"
        )));
    }
    let signature = opcode.signature();
    if present != signature.len() {
        return Err(Error::Program(format!(
            "{} takes {} operand(s), {} given in order {order}",
            opcode.name(),
            signature.len(),
            present
        )));
    }

    let mut args = Vec::with_capacity(present);
    for (element, slot) in slots.into_iter().flatten().zip(signature) {
        args.push(parse_operand(element, *slot, order)?);
    }

    Ok(Instruction {
        opcode,
        order,
        args,
    })
}

fn parse_operand(element: &Element, slot: Slot, order: u32) -> Result<Operand> {
    let kind = element.attributes.get("type").ok_or_else(|| {
        Error::Program(format!(
            "argument without a 'type' attribute in order {order}"
        ))
    })?;
    let operand = Operand::decode(kind, &argument_text(element)?)?;
    if !slot.admits(&operand) {
        return Err(Error::Program(format!(
            "{} operand where {} is expected in order {order}",
            operand.class_name(),
            slot.name()
        )));
    }
    Ok(operand)
}

/// The text payload of an argument element. An absent payload (an empty
/// element) is the empty string.
fn argument_text(element: &Element) -> Result<String> {
    let mut text = String::new();
    for node in &element.children {
        match node {
            XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
            XMLNode::Comment(_) => {}
            _ => {
                return Err(Error::Program(format!(
                    "unexpected content in element '{}'",
                    element.name
                )));
            }
        }
    }
    Ok(text)
}

/// Filter one child node: elements pass through, whitespace and comments
/// are dropped, anything else is a structural error.
fn significant<'a>(node: &'a XMLNode, context: &str) -> Result<Option<&'a Element>> {
    match node {
        XMLNode::Element(element) => Ok(Some(element)),
        XMLNode::Text(text) if text.trim().is_empty() => Ok(None),
        XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..) => Ok(None),
        _ => Err(Error::Program(format!(
            "unexpected content in element '{context}'"
        ))),
    }
}
