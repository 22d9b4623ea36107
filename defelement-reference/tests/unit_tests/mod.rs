mod families;
mod lagrange;
