//! The LR35902 opcode decoder: one exhaustive match over the x/y/z/p/q
//! fields of the opcode byte (x = bits 7-6, y = bits 5-3, z = bits 2-0,
//! p = y >> 1, q = y & 1), and the same split again for the 0xCB table.
//!
//! Handlers charge T-cycles on the CPU as they go; `(HL)` register-field
//! accesses pay the documented extra memory cycles through the per-case
//! totals.

use crate::cpu::{Cpu, CpuResult, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};
use crate::memory_bus::MemoryBus;
use lazy_static::lazy_static;

const R8_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP_NAMES: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP2_NAMES: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC_NAMES: [&str; 4] = ["NZ", "Z", "NC", "C"];
const ALU_NAMES: [&str; 8] = ["ADD", "ADC", "SUB", "SBC", "AND", "XOR", "OR", "CP"];

lazy_static! {
    /// Mnemonic per base opcode, generated from the same field split the
    /// decoder uses. Debug/trace metadata only.
    pub static ref OPCODE_NAMES: [String; 256] =
        std::array::from_fn(|op| mnemonic(op as u8));
}

fn mnemonic(op: u8) -> String {
    let x = op >> 6;
    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let p = (y >> 1) as usize;
    let q = y & 1;

    match x {
        0 => match z {
            0 => match y {
                0 => "NOP".into(),
                1 => "LD (a16), SP".into(),
                2 => "STOP".into(),
                3 => "JR e8".into(),
                _ => format!("JR {}, e8", CC_NAMES[(y - 4) as usize]),
            },
            1 if q == 0 => format!("LD {}, d16", RP_NAMES[p]),
            1 => format!("ADD HL, {}", RP_NAMES[p]),
            2 => {
                let target = ["(BC)", "(DE)", "(HL+)", "(HL-)"][p];
                if q == 0 {
                    format!("LD {}, A", target)
                } else {
                    format!("LD A, {}", target)
                }
            }
            3 if q == 0 => format!("INC {}", RP_NAMES[p]),
            3 => format!("DEC {}", RP_NAMES[p]),
            4 => format!("INC {}", R8_NAMES[y as usize]),
            5 => format!("DEC {}", R8_NAMES[y as usize]),
            6 => format!("LD {}, d8", R8_NAMES[y as usize]),
            _ => ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y as usize]
                .into(),
        },
        1 if op == 0x76 => "HALT".into(),
        1 => format!("LD {}, {}", R8_NAMES[y as usize], R8_NAMES[z as usize]),
        2 => format!("{} A, {}", ALU_NAMES[y as usize], R8_NAMES[z as usize]),
        _ => match z {
            0 => match y {
                0..=3 => format!("RET {}", CC_NAMES[y as usize]),
                4 => "LDH (a8), A".into(),
                5 => "ADD SP, e8".into(),
                6 => "LDH A, (a8)".into(),
                _ => "LD HL, SP+e8".into(),
            },
            1 if q == 0 => format!("POP {}", RP2_NAMES[p]),
            1 => ["RET", "RETI", "JP HL", "LD SP, HL"][p].into(),
            2 => match y {
                0..=3 => format!("JP {}, a16", CC_NAMES[y as usize]),
                4 => "LD (FF00+C), A".into(),
                5 => "LD (a16), A".into(),
                6 => "LD A, (FF00+C)".into(),
                _ => "LD A, (a16)".into(),
            },
            3 => match y {
                0 => "JP a16".into(),
                1 => "PREFIX CB".into(),
                6 => "DI".into(),
                7 => "EI".into(),
                _ => format!("DB {:02X}", op),
            },
            4 if y <= 3 => format!("CALL {}, a16", CC_NAMES[y as usize]),
            4 => format!("DB {:02X}", op),
            5 if q == 0 => format!("PUSH {}", RP2_NAMES[p]),
            5 if p == 0 => "CALL a16".into(),
            5 => format!("DB {:02X}", op),
            6 => format!("{} A, d8", ALU_NAMES[y as usize]),
            _ => format!("RST {:02X}", y * 8),
        },
    }
}

/// Register-field read for r8 encoding {B,C,D,E,H,L,(HL),A}.
#[inline(always)]
fn read_r8(cpu: &Cpu, bus: &MemoryBus, r: u8) -> u8 {
    match r {
        0 => cpu.b,
        1 => cpu.c,
        2 => cpu.d,
        3 => cpu.e,
        4 => cpu.h,
        5 => cpu.l,
        6 => bus.read_byte(cpu.get_hl()),
        _ => cpu.a,
    }
}

#[inline(always)]
fn write_r8(cpu: &mut Cpu, bus: &mut MemoryBus, r: u8, value: u8) {
    match r {
        0 => cpu.b = value,
        1 => cpu.c = value,
        2 => cpu.d = value,
        3 => cpu.e = value,
        4 => cpu.h = value,
        5 => cpu.l = value,
        6 => bus.write_byte(cpu.get_hl(), value),
        _ => cpu.a = value,
    }
}

/// Register-pair read for rp encoding {BC,DE,HL,SP}.
#[inline(always)]
fn read_rp(cpu: &Cpu, p: u8) -> u16 {
    match p & 0x03 {
        0 => cpu.get_bc(),
        1 => cpu.get_de(),
        2 => cpu.get_hl(),
        _ => cpu.sp,
    }
}

#[inline(always)]
fn write_rp(cpu: &mut Cpu, p: u8, value: u16) {
    match p & 0x03 {
        0 => cpu.set_bc(value),
        1 => cpu.set_de(value),
        2 => cpu.set_hl(value),
        _ => cpu.sp = value,
    }
}

/// Register-pair read for rp2 encoding {BC,DE,HL,AF} (PUSH/POP).
#[inline(always)]
fn read_rp2(cpu: &Cpu, p: u8) -> u16 {
    match p & 0x03 {
        0 => cpu.get_bc(),
        1 => cpu.get_de(),
        2 => cpu.get_hl(),
        _ => cpu.get_af(),
    }
}

#[inline(always)]
fn write_rp2(cpu: &mut Cpu, p: u8, value: u16) {
    match p & 0x03 {
        0 => cpu.set_bc(value),
        1 => cpu.set_de(value),
        2 => cpu.set_hl(value),
        _ => cpu.set_af(value),
    }
}

#[inline(always)]
fn condition(cpu: &Cpu, cc: u8) -> bool {
    match cc & 0x03 {
        0 => !cpu.get_flag(FLAG_Z), // NZ
        1 => cpu.get_flag(FLAG_Z),  // Z
        2 => !cpu.get_flag(FLAG_C), // NC
        _ => cpu.get_flag(FLAG_C),  // C
    }
}

#[inline(always)]
fn alu_a(cpu: &mut Cpu, alu: u8, value: u8) {
    match alu & 0x07 {
        0 => cpu.add_a(value, false),
        1 => cpu.add_a(value, true),
        2 => cpu.sub_a(value, false),
        3 => cpu.sub_a(value, true),
        4 => cpu.and_a(value),
        5 => cpu.xor_a(value),
        6 => cpu.or_a(value),
        _ => cpu.cp_a(value),
    }
}

/// Executes one base-table opcode. The PC already points past the opcode
/// byte; operand fetches advance it further.
pub fn execute(cpu: &mut Cpu, bus: &mut MemoryBus, opcode: u8) -> CpuResult<()> {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = y >> 1;
    let q = y & 1;

    match x {
        0 => match z {
            0 => match y {
                0 => cpu.add_cycles(4), // NOP
                1 => {
                    // LD (a16), SP
                    let addr = cpu.fetch16(bus);
                    bus.write_byte(addr, (cpu.sp & 0xFF) as u8);
                    bus.write_byte(addr.wrapping_add(1), (cpu.sp >> 8) as u8);
                    cpu.add_cycles(20);
                }
                2 => {
                    // STOP n8: consume the operand, idle until a button.
                    let _ = cpu.fetch8(bus);
                    cpu.stopped = true;
                    cpu.add_cycles(4);
                }
                3 => {
                    // JR e8
                    let rel = cpu.fetch8(bus) as i8;
                    cpu.pc = cpu.pc.wrapping_add(rel as i16 as u16);
                    cpu.add_cycles(12);
                }
                _ => {
                    // JR cc, e8
                    let rel = cpu.fetch8(bus) as i8;
                    if condition(cpu, y - 4) {
                        cpu.pc = cpu.pc.wrapping_add(rel as i16 as u16);
                        cpu.add_cycles(12);
                    } else {
                        cpu.add_cycles(8);
                    }
                }
            },
            1 => {
                if q == 0 {
                    // LD rp[p], d16
                    let imm = cpu.fetch16(bus);
                    write_rp(cpu, p, imm);
                    cpu.add_cycles(12);
                } else {
                    // ADD HL, rp[p]
                    cpu.add_hl(read_rp(cpu, p));
                    cpu.add_cycles(8);
                }
            }
            2 => {
                // LD (BC/DE/HL+/HL-), A and LD A, (...)
                let addr = match p {
                    0 => cpu.get_bc(),
                    1 => cpu.get_de(),
                    2 => {
                        let hl = cpu.get_hl();
                        cpu.set_hl(hl.wrapping_add(1));
                        hl
                    }
                    _ => {
                        let hl = cpu.get_hl();
                        cpu.set_hl(hl.wrapping_sub(1));
                        hl
                    }
                };
                if q == 0 {
                    bus.write_byte(addr, cpu.a);
                } else {
                    cpu.a = bus.read_byte(addr);
                }
                cpu.add_cycles(8);
            }
            3 => {
                // INC/DEC rp[p] (no flags)
                let value = read_rp(cpu, p);
                let value = if q == 0 {
                    value.wrapping_add(1)
                } else {
                    value.wrapping_sub(1)
                };
                write_rp(cpu, p, value);
                cpu.add_cycles(8);
            }
            4 => {
                // INC r[y]
                let value = read_r8(cpu, bus, y);
                let value = cpu.inc8(value);
                write_r8(cpu, bus, y, value);
                cpu.add_cycles(if y == 6 { 12 } else { 4 });
            }
            5 => {
                // DEC r[y]
                let value = read_r8(cpu, bus, y);
                let value = cpu.dec8(value);
                write_r8(cpu, bus, y, value);
                cpu.add_cycles(if y == 6 { 12 } else { 4 });
            }
            6 => {
                // LD r[y], d8
                let imm = cpu.fetch8(bus);
                write_r8(cpu, bus, y, imm);
                cpu.add_cycles(if y == 6 { 12 } else { 8 });
            }
            _ => {
                match y {
                    0 => {
                        // RLCA (Z cleared, unlike CB RLC)
                        let a = cpu.a;
                        cpu.a = cpu.rlc(a);
                        cpu.set_flag(FLAG_Z, false);
                    }
                    1 => {
                        let a = cpu.a;
                        cpu.a = cpu.rrc(a);
                        cpu.set_flag(FLAG_Z, false);
                    }
                    2 => {
                        let a = cpu.a;
                        cpu.a = cpu.rl(a);
                        cpu.set_flag(FLAG_Z, false);
                    }
                    3 => {
                        let a = cpu.a;
                        cpu.a = cpu.rr(a);
                        cpu.set_flag(FLAG_Z, false);
                    }
                    4 => cpu.daa(),
                    5 => {
                        // CPL
                        cpu.a = !cpu.a;
                        cpu.set_flag(FLAG_N | FLAG_H, true);
                    }
                    6 => {
                        // SCF
                        cpu.set_flag(FLAG_N | FLAG_H, false);
                        cpu.set_flag(FLAG_C, true);
                    }
                    _ => {
                        // CCF
                        let carry = cpu.get_flag(FLAG_C);
                        cpu.set_flag(FLAG_N | FLAG_H, false);
                        cpu.set_flag(FLAG_C, !carry);
                    }
                }
                cpu.add_cycles(4);
            }
        },
        1 => {
            if opcode == 0x76 {
                // HALT. With IME=0 and an interrupt already pending the
                // halt is skipped and the next byte is fetched twice.
                if !cpu.ime
                    && bus.read_byte(crate::memory_map::IF_ADDR)
                        & bus.read_byte(crate::memory_map::INTERRUPT_ENABLE_REGISTER)
                        & 0x1F
                        != 0
                {
                    cpu.halt_bug = true;
                } else {
                    cpu.halted = true;
                }
                cpu.add_cycles(4);
            } else {
                // LD r[y], r[z]
                let value = read_r8(cpu, bus, z);
                write_r8(cpu, bus, y, value);
                cpu.add_cycles(if y == 6 || z == 6 { 8 } else { 4 });
            }
        }
        2 => {
            // ALU[y] A, r[z]
            let value = read_r8(cpu, bus, z);
            alu_a(cpu, y, value);
            cpu.add_cycles(if z == 6 { 8 } else { 4 });
        }
        _ => match z {
            0 => match y {
                0..=3 => {
                    // RET cc
                    if condition(cpu, y) {
                        cpu.pc = cpu.pop16(bus);
                        cpu.add_cycles(20);
                    } else {
                        cpu.add_cycles(8);
                    }
                }
                4 => {
                    // LDH (a8), A
                    let offset = cpu.fetch8(bus) as u16;
                    bus.write_byte(0xFF00 + offset, cpu.a);
                    cpu.add_cycles(12);
                }
                5 => {
                    // ADD SP, e8
                    let e8 = cpu.fetch8(bus) as i8;
                    cpu.sp = cpu.add_sp_e8(e8);
                    cpu.add_cycles(16);
                }
                6 => {
                    // LDH A, (a8)
                    let offset = cpu.fetch8(bus) as u16;
                    cpu.a = bus.read_byte(0xFF00 + offset);
                    cpu.add_cycles(12);
                }
                _ => {
                    // LD HL, SP+e8
                    let e8 = cpu.fetch8(bus) as i8;
                    let result = cpu.add_sp_e8(e8);
                    cpu.set_hl(result);
                    cpu.add_cycles(12);
                }
            },
            1 => {
                if q == 0 {
                    // POP rp2[p]
                    let value = cpu.pop16(bus);
                    write_rp2(cpu, p, value);
                    cpu.add_cycles(12);
                } else {
                    match p {
                        0 => {
                            // RET
                            cpu.pc = cpu.pop16(bus);
                            cpu.add_cycles(16);
                        }
                        1 => {
                            // RETI: IME restored immediately
                            cpu.pc = cpu.pop16(bus);
                            cpu.ime = true;
                            cpu.ime_pending = 0;
                            cpu.add_cycles(16);
                        }
                        2 => {
                            // JP HL
                            cpu.pc = cpu.get_hl();
                            cpu.add_cycles(4);
                        }
                        _ => {
                            // LD SP, HL
                            cpu.sp = cpu.get_hl();
                            cpu.add_cycles(8);
                        }
                    }
                }
            }
            2 => match y {
                0..=3 => {
                    // JP cc, a16
                    let addr = cpu.fetch16(bus);
                    if condition(cpu, y) {
                        cpu.pc = addr;
                        cpu.add_cycles(16);
                    } else {
                        cpu.add_cycles(12);
                    }
                }
                4 => {
                    // LD (FF00+C), A
                    bus.write_byte(0xFF00 + cpu.c as u16, cpu.a);
                    cpu.add_cycles(8);
                }
                5 => {
                    // LD (a16), A
                    let addr = cpu.fetch16(bus);
                    bus.write_byte(addr, cpu.a);
                    cpu.add_cycles(16);
                }
                6 => {
                    // LD A, (FF00+C)
                    cpu.a = bus.read_byte(0xFF00 + cpu.c as u16);
                    cpu.add_cycles(8);
                }
                _ => {
                    // LD A, (a16)
                    let addr = cpu.fetch16(bus);
                    cpu.a = bus.read_byte(addr);
                    cpu.add_cycles(16);
                }
            },
            3 => match y {
                0 => {
                    // JP a16
                    cpu.pc = cpu.fetch16(bus);
                    cpu.add_cycles(16);
                }
                1 => {
                    // 0xCB prefix
                    let cb = cpu.fetch8(bus);
                    execute_cb(cpu, bus, cb);
                }
                6 => {
                    // DI: immediate
                    cpu.ime = false;
                    cpu.ime_pending = 0;
                    cpu.add_cycles(4);
                }
                7 => {
                    // EI: takes effect after the next instruction
                    cpu.ime_pending = 2;
                    cpu.add_cycles(4);
                }
                _ => return illegal(opcode),
            },
            4 => match y {
                0..=3 => {
                    // CALL cc, a16
                    let addr = cpu.fetch16(bus);
                    if condition(cpu, y) {
                        let pc = cpu.pc;
                        cpu.push16(bus, pc);
                        cpu.pc = addr;
                        cpu.add_cycles(24);
                    } else {
                        cpu.add_cycles(12);
                    }
                }
                _ => return illegal(opcode),
            },
            5 => {
                if q == 0 {
                    // PUSH rp2[p]
                    let value = read_rp2(cpu, p);
                    cpu.push16(bus, value);
                    cpu.add_cycles(16);
                } else if p == 0 {
                    // CALL a16
                    let addr = cpu.fetch16(bus);
                    let pc = cpu.pc;
                    cpu.push16(bus, pc);
                    cpu.pc = addr;
                    cpu.add_cycles(24);
                } else {
                    return illegal(opcode);
                }
            }
            6 => {
                // ALU[y] A, d8
                let imm = cpu.fetch8(bus);
                alu_a(cpu, y, imm);
                cpu.add_cycles(8);
            }
            _ => {
                // RST y*8
                let pc = cpu.pc;
                cpu.push16(bus, pc);
                cpu.pc = (y as u16) * 0x08;
                cpu.add_cycles(16);
            }
        },
    }
    Ok(())
}

/// Executes one 0xCB-prefixed opcode. Cycle totals include the prefix.
fn execute_cb(cpu: &mut Cpu, bus: &mut MemoryBus, opcode: u8) {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let value = read_r8(cpu, bus, z);

    match x {
        0 => {
            let result = match y {
                0 => cpu.rlc(value),
                1 => cpu.rrc(value),
                2 => cpu.rl(value),
                3 => cpu.rr(value),
                4 => cpu.sla(value),
                5 => cpu.sra(value),
                6 => cpu.swap(value),
                _ => cpu.srl(value),
            };
            write_r8(cpu, bus, z, result);
            cpu.add_cycles(if z == 6 { 16 } else { 8 });
        }
        1 => {
            // BIT y, r[z]: Z from the complement of the bit, C unchanged.
            cpu.set_flag(FLAG_Z, value & (1 << y) == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, true);
            cpu.add_cycles(if z == 6 { 12 } else { 8 });
        }
        2 => {
            // RES y, r[z]
            write_r8(cpu, bus, z, value & !(1 << y));
            cpu.add_cycles(if z == 6 { 16 } else { 8 });
        }
        _ => {
            // SET y, r[z]
            write_r8(cpu, bus, z, value | (1 << y));
            cpu.add_cycles(if z == 6 { 16 } else { 8 });
        }
    }
}

fn illegal(opcode: u8) -> CpuResult<()> {
    Err(format!("illegal opcode {:#04X}", opcode))
}
