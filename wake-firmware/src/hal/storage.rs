// Konfigurations-Datensatz im Flash
//
// Layout ab CONFIG_FLASH_OFFSET: u16 Länge (little endian), danach der
// JSON-Datensatz. Ein gelöschter Sektor liest 0xFFFF = nichts gespeichert.

use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;
use wake_core::config::CONFIG_RECORD_LEN;
use wake_core::{ConfigStore, StoreError};

use crate::config::CONFIG_FLASH_OFFSET;

const HEADER_LEN: usize = 2;
const ERASED: u16 = 0xFFFF;

pub struct FlashConfigStore {
    flash: FlashStorage<'static>,
}

impl FlashConfigStore {
    pub fn new(flash: FlashStorage<'static>) -> Self {
        Self { flash }
    }
}

impl ConfigStore for FlashConfigStore {
    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StoreError> {
        let mut header = [0u8; HEADER_LEN];
        self.flash
            .read(CONFIG_FLASH_OFFSET, &mut header)
            .map_err(|_| StoreError::Read)?;

        let len = u16::from_le_bytes(header);
        if len == ERASED || len == 0 {
            return Ok(None);
        }
        let len = len as usize;
        let target = buf.get_mut(..len).ok_or(StoreError::TooLarge)?;

        self.flash
            .read(CONFIG_FLASH_OFFSET + HEADER_LEN as u32, target)
            .map_err(|_| StoreError::Read)?;
        Ok(Some(len))
    }

    fn write(&mut self, record: &[u8]) -> Result<(), StoreError> {
        let mut data = [0u8; HEADER_LEN + CONFIG_RECORD_LEN];
        let len = record.len();
        if len > CONFIG_RECORD_LEN {
            return Err(StoreError::TooLarge);
        }

        data[..HEADER_LEN].copy_from_slice(&(len as u16).to_le_bytes());
        data[HEADER_LEN..HEADER_LEN + len].copy_from_slice(record);

        // Storage::write löscht den Sektor selbst (read-modify-write)
        self.flash
            .write(CONFIG_FLASH_OFFSET, &data[..HEADER_LEN + len])
            .map_err(|_| StoreError::Write)
    }
}
