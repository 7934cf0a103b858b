// Library-Root: Hardware-Adapter und Tasks der Wake-Light Firmware
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod ble;
pub mod config;
pub mod hal;
pub mod net;
pub mod tasks;
pub mod time;

// Die Logik (Zeitplan, Fade, Taster, Schlaf-Entscheidung) liegt in wake-core
// und wird dort auf dem Host getestet. Dieses Crate baut nur für
// riscv32imac-unknown-none-elf und enthält deshalb keine Tests.
