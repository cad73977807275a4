pub mod ussddtos;
