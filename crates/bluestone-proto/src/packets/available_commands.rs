//! AvailableCommands (0x4C) — Server → Client.
//!
//! The densest layout in the protocol: a shared enum-value table, enums
//! referencing it with index sizes that depend on the table length, and
//! per-command overload lists.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Argument types understood by 1.2 clients (the `0x100000`-tagged set).
pub mod arg_type {
    pub const INT: u32 = 0x10_0001;
    pub const FLOAT: u32 = 0x10_0002;
    pub const VALUE: u32 = 0x10_0003;
    pub const TARGET: u32 = 0x10_0004;
    pub const STRING: u32 = 0x10_000D;
    pub const POSITION: u32 = 0x10_000E;
    pub const RAWTEXT: u32 = 0x10_0011;
}

/// A named enum over indices into the shared value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnum {
    pub name: String,
    pub value_indices: Vec<u32>,
}

/// One parameter of one overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParameter {
    pub name: String,
    pub arg_type: u32,
    pub optional: bool,
}

/// One command with its overloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandData {
    pub name: String,
    pub description: String,
    pub flags: u8,
    pub permission: u8,
    /// Index into `enums` for the alias enum, or -1.
    pub alias_enum: i32,
    pub overloads: Vec<Vec<CommandParameter>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvailableCommands {
    pub enum_values: Vec<String>,
    pub postfixes: Vec<String>,
    pub enums: Vec<CommandEnum>,
    pub commands: Vec<CommandData>,
}

/// Enum indices shrink with the value table.
fn write_enum_index(buf: &mut impl BufMut, index: u32, value_count: usize) {
    if value_count <= 0xFF {
        buf.put_u8(index as u8);
    } else if value_count <= 0xFFFF {
        buf.put_u16_le(index as u16);
    } else {
        buf.put_u32_le(index);
    }
}

fn read_enum_index(buf: &mut impl Buf, value_count: usize) -> Result<u32, ProtoError> {
    if value_count <= 0xFF {
        ensure(buf, 1)?;
        Ok(buf.get_u8() as u32)
    } else if value_count <= 0xFFFF {
        ensure(buf, 2)?;
        Ok(buf.get_u16_le() as u32)
    } else {
        ensure(buf, 4)?;
        Ok(buf.get_u32_le())
    }
}

impl ProtoEncode for AvailableCommands {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.enum_values.len() as u32).proto_encode(buf);
        for value in &self.enum_values {
            write_string(buf, value);
        }

        VarUInt32(self.postfixes.len() as u32).proto_encode(buf);
        for postfix in &self.postfixes {
            write_string(buf, postfix);
        }

        VarUInt32(self.enums.len() as u32).proto_encode(buf);
        for e in &self.enums {
            write_string(buf, &e.name);
            VarUInt32(e.value_indices.len() as u32).proto_encode(buf);
            for &idx in &e.value_indices {
                write_enum_index(buf, idx, self.enum_values.len());
            }
        }

        VarUInt32(self.commands.len() as u32).proto_encode(buf);
        for cmd in &self.commands {
            write_string(buf, &cmd.name);
            write_string(buf, &cmd.description);
            buf.put_u8(cmd.flags);
            buf.put_u8(cmd.permission);
            buf.put_i32_le(cmd.alias_enum);
            VarUInt32(cmd.overloads.len() as u32).proto_encode(buf);
            for overload in &cmd.overloads {
                VarUInt32(overload.len() as u32).proto_encode(buf);
                for param in overload {
                    write_string(buf, &param.name);
                    buf.put_u32_le(param.arg_type);
                    buf.put_u8(param.optional as u8);
                }
            }
        }
    }
}

impl ProtoDecode for AvailableCommands {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let value_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut enum_values = Vec::with_capacity(value_count.min(256));
        for _ in 0..value_count {
            enum_values.push(read_string(buf)?);
        }

        let postfix_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut postfixes = Vec::with_capacity(postfix_count.min(64));
        for _ in 0..postfix_count {
            postfixes.push(read_string(buf)?);
        }

        let enum_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut enums = Vec::with_capacity(enum_count.min(64));
        for _ in 0..enum_count {
            let name = read_string(buf)?;
            let index_count = VarUInt32::proto_decode(buf)?.0 as usize;
            let mut value_indices = Vec::with_capacity(index_count.min(256));
            for _ in 0..index_count {
                value_indices.push(read_enum_index(buf, value_count)?);
            }
            enums.push(CommandEnum {
                name,
                value_indices,
            });
        }

        let command_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut commands = Vec::with_capacity(command_count.min(64));
        for _ in 0..command_count {
            let name = read_string(buf)?;
            let description = read_string(buf)?;
            ensure(buf, 6)?;
            let flags = buf.get_u8();
            let permission = buf.get_u8();
            let alias_enum = buf.get_i32_le();
            let overload_count = VarUInt32::proto_decode(buf)?.0 as usize;
            let mut overloads = Vec::with_capacity(overload_count.min(16));
            for _ in 0..overload_count {
                let param_count = VarUInt32::proto_decode(buf)?.0 as usize;
                let mut params = Vec::with_capacity(param_count.min(16));
                for _ in 0..param_count {
                    let pname = read_string(buf)?;
                    ensure(buf, 5)?;
                    let arg_type = buf.get_u32_le();
                    let optional = buf.get_u8() != 0;
                    params.push(CommandParameter {
                        name: pname,
                        arg_type,
                        optional,
                    });
                }
                overloads.push(params);
            }
            commands.push(CommandData {
                name,
                description,
                flags,
                permission,
                alias_enum,
                overloads,
            });
        }

        Ok(Self {
            enum_values,
            postfixes,
            enums,
            commands,
        })
    }
}

impl AvailableCommands {
    /// The command set this server always advertises.
    pub fn defaults() -> Self {
        Self {
            enum_values: Vec::new(),
            postfixes: Vec::new(),
            enums: Vec::new(),
            commands: vec![
                CommandData {
                    name: "say".into(),
                    description: "Broadcast a message".into(),
                    flags: 0,
                    permission: 0,
                    alias_enum: -1,
                    overloads: vec![vec![CommandParameter {
                        name: "message".into(),
                        arg_type: arg_type::RAWTEXT,
                        optional: false,
                    }]],
                },
                CommandData {
                    name: "time".into(),
                    description: "Set or query the world time".into(),
                    flags: 0,
                    permission: 0,
                    alias_enum: -1,
                    overloads: vec![vec![CommandParameter {
                        name: "value".into(),
                        arg_type: arg_type::INT,
                        optional: true,
                    }]],
                },
            ],
        }
    }
}
