pub mod invoice_buttons;
