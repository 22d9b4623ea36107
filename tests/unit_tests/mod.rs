mod element;
mod example;
mod implementations;
mod verification;
